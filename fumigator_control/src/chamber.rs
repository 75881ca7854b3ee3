//! Chamber orchestration.
//!
//! A [`Chamber`] owns one PID and one schedule per gas, plus the duty
//! slot feeding its valve task. Each control cycle runs the fixed
//! sequence: resolve targets → route and purge the sample line → read a
//! windowed mean concentration → update the PIDs → dispatch the CO2 duty
//! command → append a CSV record → emit a status line.
//!
//! Chambers live in an explicitly owned registry passed to the
//! fumigation loop; there is no ambient global chamber state.

use std::collections::BTreeMap;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{Local, NaiveTime};
use thiserror::Error;
use tracing::{info, warn};

use fumigator_common::config::{ChamberConfig, FumigatorConfig, GasLoopConfig};
use fumigator_common::daq::{self, DaqDevice, DaqError};
use fumigator_common::gas::{ALL_GASES, Gas};

use crate::control::pid::Pid;
use crate::datalog::{CycleRecord, DataLogger};
use crate::schedule::Schedule;
use crate::slot::{DutySender, duty_slot};
use crate::valve::spawn_valve_task;

/// Chamber construction error. Startup-fatal.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("chamber {channel}: {reason}")]
    Invalid { channel: u8, reason: String },

    #[error(transparent)]
    Daq(#[from] DaqError),

    #[error("failed to spawn valve task: {0}")]
    Spawn(#[from] io::Error),
}

// ─── Gas Loop ───────────────────────────────────────────────────────

/// One gas's control loop state inside a chamber.
#[derive(Debug)]
struct GasLoop {
    enabled: bool,
    pid: Pid,
    /// `None` only for a disabled loop configured without timepoints.
    schedule: Option<Schedule>,
    last_conc: f64,
    last_target: f64,
    last_output: f64,
}

impl GasLoop {
    fn new(cfg: &GasLoopConfig) -> Result<Self, String> {
        let schedule = if cfg.schedule.is_empty() {
            None
        } else {
            Some(Schedule::new(cfg.schedule.clone())?)
        };
        Ok(Self {
            enabled: cfg.enabled,
            pid: Pid::new(cfg.pid),
            schedule,
            last_conc: 0.0,
            last_target: 0.0,
            last_output: 0.0,
        })
    }

    /// Re-tune from config without clearing PID history.
    fn retune(&mut self, cfg: &GasLoopConfig) -> Result<(), String> {
        self.enabled = cfg.enabled;
        self.schedule = if cfg.schedule.is_empty() {
            None
        } else {
            Some(Schedule::new(cfg.schedule.clone())?)
        };
        self.pid.set_params(self.last_target, cfg.pid);
        Ok(())
    }

    fn resolve_target(&mut self, now: NaiveTime) {
        if let Some(schedule) = &self.schedule {
            let target = schedule.target_at(now);
            self.pid.set_target(target);
            self.last_target = target;
        }
    }

    /// Feed one mean concentration through the loop. A disabled loop
    /// records the reading and forces zero output, leaving PID state
    /// untouched.
    fn absorb(&mut self, conc: f64) {
        self.last_conc = conc;
        self.last_output = if self.enabled { self.pid.update(conc) } else { 0.0 };
    }
}

// ─── Chamber ────────────────────────────────────────────────────────

/// One growth chamber under closed-loop control.
pub struct Chamber {
    channel: u8,
    co2: GasLoop,
    o3: GasLoop,
    duty_tx: DutySender,
    valve_task: JoinHandle<()>,
    applied_version: u64,
}

impl Chamber {
    /// Build a chamber and launch its valve task.
    ///
    /// The valve task gets its own handle to the DAQ and touches only
    /// this chamber's solenoid channel.
    pub fn new(
        cfg: &ChamberConfig,
        dev: &dyn DaqDevice,
        cycle: Duration,
    ) -> Result<Self, StartupError> {
        let co2 = GasLoop::new(&cfg.co2).map_err(|reason| StartupError::Invalid {
            channel: cfg.channel,
            reason,
        })?;
        let o3 = GasLoop::new(&cfg.o3).map_err(|reason| StartupError::Invalid {
            channel: cfg.channel,
            reason,
        })?;

        let (duty_tx, duty_rx) = duty_slot();
        let valve_dev = dev.try_clone()?;
        let valve_task = spawn_valve_task(valve_dev, cfg.channel, cycle, duty_rx)?;

        Ok(Self {
            channel: cfg.channel,
            co2,
            o3,
            duty_tx,
            valve_task,
            applied_version: 0,
        })
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Whether the valve task is still alive (watchdog has not fired).
    pub fn valve_running(&self) -> bool {
        !self.valve_task.is_finished()
    }

    /// Apply a reloaded config snapshot. Idempotent per version.
    pub fn apply_config(&mut self, cfg: &ChamberConfig, version: u64) -> Result<(), String> {
        if version == self.applied_version {
            return Ok(());
        }
        self.co2.retune(&cfg.co2)?;
        self.o3.retune(&cfg.o3)?;
        self.applied_version = version;
        Ok(())
    }

    /// Run one control cycle for this chamber.
    ///
    /// Sampling failures abort only this chamber's cycle; log-write
    /// failures are warned about and discarded.
    pub fn run_cycle(
        &mut self,
        dev: &mut dyn DaqDevice,
        cfg: &FumigatorConfig,
    ) -> Result<(), DaqError> {
        let now = Local::now().time();
        self.co2.resolve_target(now);
        self.o3.resolve_target(now);

        // Two-position line valve: the channel bit routes the shared
        // sample line to this chamber.
        dev.digital_out(cfg.sample_line_channel, self.channel != 0)?;
        thread::sleep(Duration::from_secs_f64(cfg.purge_secs));

        let means = daq::sample_mean(
            dev,
            &ALL_GASES,
            Duration::from_secs_f64(cfg.sample_secs),
        )?;
        self.co2
            .absorb(means.get(&Gas::Co2).copied().unwrap_or(0.0));
        self.o3.absorb(means.get(&Gas::O3).copied().unwrap_or(0.0));

        self.duty_tx.send(self.co2.last_output);
        // O3 dispatch: no output hardware is fitted; the loop result only
        // reaches the cycle record below.

        let record = CycleRecord::stamp_now(
            self.channel,
            self.co2.last_conc,
            self.co2.last_target,
            self.co2.last_output,
            self.o3.last_conc,
            self.o3.last_target,
            self.o3.last_output,
        );
        let logger = DataLogger::new(&cfg.data_dir);
        if let Err(e) = logger.append(&record) {
            warn!("chamber {}: log write skipped: {e}", self.channel + 1);
        }

        info!(
            "chamber {}: CO2 {:.1} {} (target {:.1}) duty {:.3} | O3 {:.1} {} (target {:.1})",
            self.channel + 1,
            self.co2.last_conc,
            Gas::Co2.unit(),
            self.co2.last_target,
            self.co2.last_output,
            self.o3.last_conc,
            Gas::O3.unit(),
            self.o3.last_target,
        );
        Ok(())
    }
}

// ─── Registry ───────────────────────────────────────────────────────

/// Owned chamber registry, iterated in ascending channel order.
pub type ChamberRegistry = BTreeMap<u8, Chamber>;

/// Build the registry from validated config, launching one valve task
/// per chamber.
pub fn build_registry(
    cfg: &FumigatorConfig,
    dev: &dyn DaqDevice,
) -> Result<ChamberRegistry, StartupError> {
    let cycle = Duration::from_secs_f64(cfg.cycle_secs);
    cfg.chambers
        .iter()
        .map(|chamber_cfg| {
            Chamber::new(chamber_cfg, dev, cycle).map(|chamber| (chamber_cfg.channel, chamber))
        })
        .collect()
}
