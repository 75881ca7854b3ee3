//! Duty-cycle timing of the valve task.
//!
//! A duty fraction of 0.25 over a 400 ms period must hold the solenoid
//! ON for roughly 100 ms and OFF for roughly 300 ms; 0 must never open
//! the valve, 1 must never close it while commands keep arriving.

use std::time::Duration;

use fumigator_common::daq::sim::SimDaq;
use fumigator_common::daq::DaqDevice;
use fumigator_control::slot::duty_slot;
use fumigator_control::valve::spawn_valve_task;

const CHANNEL: u8 = 0;

#[test]
fn quarter_duty_splits_the_period() {
    let sim = SimDaq::new();
    let (tx, rx) = duty_slot();
    tx.send(0.25);
    let handle = spawn_valve_task(
        sim.try_clone().unwrap(),
        CHANNEL,
        Duration::from_millis(400),
        rx,
    )
    .unwrap();

    // Keep the watchdog fed for three full periods.
    for _ in 0..12 {
        std::thread::sleep(Duration::from_millis(100));
        tx.send(0.25);
    }
    let writes = sim.transitions_for(CHANNEL);
    drop(handle);

    // ON → OFF → ON → OFF ...
    assert!(writes.len() >= 4, "expected several pulses, got {}", writes.len());
    assert!(writes[0].state);
    for pair in writes.windows(2) {
        assert_ne!(pair[0].state, pair[1].state, "phases must alternate");
        let span = pair[1].at.duration_since(pair[0].at);
        if pair[0].state {
            // ON phase ≈ 0.25 * 400 ms.
            assert!(
                span >= Duration::from_millis(70) && span <= Duration::from_millis(200),
                "ON phase was {span:?}"
            );
        } else {
            // OFF phase ≈ 0.75 * 400 ms.
            assert!(
                span >= Duration::from_millis(240) && span <= Duration::from_millis(500),
                "OFF phase was {span:?}"
            );
        }
    }
}

#[test]
fn zero_duty_never_opens_the_valve() {
    let sim = SimDaq::new();
    let (tx, rx) = duty_slot();
    tx.send(0.0);
    let _handle = spawn_valve_task(
        sim.try_clone().unwrap(),
        CHANNEL,
        Duration::from_millis(20),
        rx,
    )
    .unwrap();

    for _ in 0..10 {
        std::thread::sleep(Duration::from_millis(20));
        tx.send(0.0);
    }

    let writes = sim.transitions_for(CHANNEL);
    assert!(!writes.is_empty());
    assert!(writes.iter().all(|t| !t.state), "valve opened at zero duty");
}

#[test]
fn full_duty_never_closes_the_valve() {
    let sim = SimDaq::new();
    let (tx, rx) = duty_slot();
    tx.send(1.0);
    let _handle = spawn_valve_task(
        sim.try_clone().unwrap(),
        CHANNEL,
        Duration::from_millis(20),
        rx,
    )
    .unwrap();

    for _ in 0..10 {
        std::thread::sleep(Duration::from_millis(20));
        tx.send(1.0);
    }

    // Snapshot while the watchdog is still fed; the shutdown close after
    // expiry is not part of the duty cycle.
    let writes = sim.transitions_for(CHANNEL);
    assert!(!writes.is_empty());
    assert!(writes.iter().all(|t| t.state), "valve closed at full duty");
}

#[test]
fn out_of_range_commands_are_clamped_by_the_task() {
    let sim = SimDaq::new();
    let (tx, rx) = duty_slot();
    tx.send(7.5); // clamps to 1.0: ON only
    let _handle = spawn_valve_task(
        sim.try_clone().unwrap(),
        CHANNEL,
        Duration::from_millis(20),
        rx,
    )
    .unwrap();

    for _ in 0..5 {
        std::thread::sleep(Duration::from_millis(20));
        tx.send(-3.0); // clamps to 0.0: OFF only, from the next poll
    }
    std::thread::sleep(Duration::from_millis(60));

    let writes = sim.transitions_for(CHANNEL);
    assert!(writes.iter().any(|t| t.state), "clamped 7.5 never opened");
    assert!(writes.iter().any(|t| !t.state), "clamped -3.0 never closed");
}
