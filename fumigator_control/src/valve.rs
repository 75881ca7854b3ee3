//! Duty-cycle valve task.
//!
//! One thread per chamber converts the latest duty fraction into timed
//! solenoid pulses: ON for `output * cycle`, OFF for the remainder,
//! repeating. The task polls its slot once per cycle and never blocks on
//! it; after [`VALVE_WATCHDOG_LIMIT`] consecutive empty polls it closes
//! the valve and terminates, so a dead orchestrator cannot leave a stale
//! duty cycle running forever.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use fumigator_common::consts::VALVE_WATCHDOG_LIMIT;
use fumigator_common::daq::DaqDevice;

use crate::slot::DutyReceiver;

/// Spawn the valve task for one chamber.
///
/// `dev` is the task's own DAQ handle; it touches only `channel`.
pub fn spawn_valve_task(
    mut dev: Box<dyn DaqDevice>,
    channel: u8,
    cycle: Duration,
    rx: DutyReceiver,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("valve-{channel}"))
        .spawn(move || run_valve_loop(dev.as_mut(), channel, cycle, &rx))
}

fn run_valve_loop(dev: &mut dyn DaqDevice, channel: u8, cycle: Duration, rx: &DutyReceiver) {
    let mut output = 0.0_f64;
    let mut missed = 0u32;

    while missed < VALVE_WATCHDOG_LIMIT {
        match rx.poll() {
            Some(duty) => {
                // Receiver-side clamp, in case a misbehaving sender got here.
                output = duty.clamp(0.0, 1.0);
                missed = 0;
            }
            None => missed += 1,
        }

        let on = cycle.mul_f64(output);
        let off = cycle.saturating_sub(on);

        if output > 0.0 {
            set_valve(dev, channel, true);
            thread::sleep(on);
        }
        if output < 1.0 {
            set_valve(dev, channel, false);
            thread::sleep(off);
        }
    }

    debug!(
        "valve {channel}: no duty command for {VALVE_WATCHDOG_LIMIT} cycles, shutting down"
    );
    set_valve(dev, channel, false);
}

// A failed toggle is logged and the cycle carries on; the watchdog is the
// only way out of the loop.
fn set_valve(dev: &mut dyn DaqDevice, channel: u8, state: bool) {
    if let Err(e) = dev.digital_out(channel, state) {
        warn!("valve {channel}: toggle failed: {e}");
    }
}
