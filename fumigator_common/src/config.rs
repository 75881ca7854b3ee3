//! Configuration structures for the fumigator daemon.
//!
//! All config types use `serde::Deserialize` for TOML loading.
//! Numeric parameters have const bounds in [`crate::consts`].
//! Optional fields use `#[serde(default)]` so a minimal chamber entry
//! stays forward-compatible.
//!
//! Schedule timepoints are quoted `"HH:MM:SS"` strings (wall clock, no
//! date); the target unit follows the gas (ppm for CO2, ppb for O3).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::consts::{
    CHAMBER_CHANNEL_MAX, CYCLE_SECS_DEFAULT, DATA_DIR_DEFAULT, DURATION_SECS_MAX,
    DURATION_SECS_MIN, PID_GAIN_DEFAULT, PID_OUT_MAX_DEFAULT, PID_OUT_MIN_DEFAULT,
    PURGE_SECS_DEFAULT, SAMPLE_LINE_CHANNEL_DEFAULT, SAMPLE_SECS_DEFAULT,
};

// ─── Top-Level Config ───────────────────────────────────────────────

/// Top-level fumigator configuration.
///
/// Loaded from TOML at startup and re-snapshotted by the control loop at
/// each chamber-cycle boundary (see the control crate's reloader).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FumigatorConfig {
    /// Root directory for per-chamber CSV cycle records.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Sample-line flush delay before reading, per chamber [s].
    #[serde(default = "default_purge_secs")]
    pub purge_secs: f64,

    /// Sensor averaging window, sampled once per second [s].
    #[serde(default = "default_sample_secs")]
    pub sample_secs: f64,

    /// Solenoid duty-cycle period [s]. Latched by valve tasks at startup.
    #[serde(default = "default_cycle_secs")]
    pub cycle_secs: f64,

    /// Digital channel of the sample-line routing valve.
    #[serde(default = "default_sample_line_channel")]
    pub sample_line_channel: u8,

    /// Controlled chambers.
    #[serde(default)]
    pub chambers: Vec<ChamberConfig>,
}

fn default_data_dir() -> String {
    DATA_DIR_DEFAULT.to_string()
}
fn default_purge_secs() -> f64 {
    PURGE_SECS_DEFAULT
}
fn default_sample_secs() -> f64 {
    SAMPLE_SECS_DEFAULT
}
fn default_cycle_secs() -> f64 {
    CYCLE_SECS_DEFAULT
}
fn default_sample_line_channel() -> u8 {
    SAMPLE_LINE_CHANNEL_DEFAULT
}

impl FumigatorConfig {
    /// Validate parameter bounds and cross-field invariants.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("purge_secs", self.purge_secs),
            ("sample_secs", self.sample_secs),
        ] {
            if !(DURATION_SECS_MIN..=DURATION_SECS_MAX).contains(&value) {
                return Err(format!(
                    "{name} {value} out of range [{DURATION_SECS_MIN}, {DURATION_SECS_MAX}]"
                ));
            }
        }
        if !(self.cycle_secs > DURATION_SECS_MIN && self.cycle_secs <= DURATION_SECS_MAX) {
            return Err(format!(
                "cycle_secs {} out of range ({DURATION_SECS_MIN}, {DURATION_SECS_MAX}]",
                self.cycle_secs
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for chamber in &self.chambers {
            if chamber.channel > CHAMBER_CHANNEL_MAX {
                return Err(format!(
                    "chamber channel {} out of range [0, {CHAMBER_CHANNEL_MAX}]",
                    chamber.channel
                ));
            }
            if chamber.channel == self.sample_line_channel {
                return Err(format!(
                    "chamber channel {} collides with sample_line_channel",
                    chamber.channel
                ));
            }
            if !seen.insert(chamber.channel) {
                return Err(format!("duplicate chamber channel {}", chamber.channel));
            }
            chamber.validate()?;
        }
        Ok(())
    }

    /// Channels of all configured chambers, unsorted.
    pub fn channels(&self) -> Vec<u8> {
        self.chambers.iter().map(|c| c.channel).collect()
    }
}

// ─── Chamber Config ─────────────────────────────────────────────────

/// One growth chamber: a solenoid channel plus one control loop per gas.
///
/// An omitted gas table leaves that loop disabled; a present table is
/// enabled unless it says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChamberConfig {
    /// DAQ digital channel of this chamber's CO2 solenoid (registry key).
    pub channel: u8,

    /// CO2 control loop.
    #[serde(default)]
    pub co2: GasLoopConfig,

    /// O3 control loop (no physical output path; logged only).
    #[serde(default)]
    pub o3: GasLoopConfig,
}

impl ChamberConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.co2
            .validate()
            .map_err(|e| format!("chamber {} co2: {e}", self.channel))?;
        self.o3
            .validate()
            .map_err(|e| format!("chamber {} o3: {e}", self.channel))?;
        Ok(())
    }
}

/// Per-gas control loop: enable flag, PID tuning, setpoint schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasLoopConfig {
    /// Whether this loop drives an output. A disabled loop still samples
    /// and logs, with output forced to zero.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// PID tuning.
    #[serde(default)]
    pub pid: PidConfig,

    /// Time-of-day setpoint schedule. Must be non-empty when enabled.
    #[serde(default)]
    pub schedule: Vec<TimepointConfig>,
}

fn default_enabled() -> bool {
    true
}

impl Default for GasLoopConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            pid: PidConfig::default(),
            schedule: Vec::new(),
        }
    }
}

impl GasLoopConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.pid.validate()?;
        if self.enabled && self.schedule.is_empty() {
            return Err("enabled loop has an empty schedule".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for tp in &self.schedule {
            if !seen.insert(tp.at) {
                return Err(format!("duplicate schedule timepoint {}", tp.at));
            }
            if !tp.target.is_finite() || tp.target < 0.0 {
                return Err(format!("schedule target {} at {} invalid", tp.target, tp.at));
            }
        }
        Ok(())
    }
}

// ─── PID Config ─────────────────────────────────────────────────────

/// PID tuning for one gas loop. Output bounds are the duty fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    #[serde(default = "default_gain")]
    pub kp: f64,
    #[serde(default = "default_gain")]
    pub ki: f64,
    #[serde(default = "default_gain")]
    pub kd: f64,
    #[serde(default = "default_out_min")]
    pub out_min: f64,
    #[serde(default = "default_out_max")]
    pub out_max: f64,
}

fn default_gain() -> f64 {
    PID_GAIN_DEFAULT
}
fn default_out_min() -> f64 {
    PID_OUT_MIN_DEFAULT
}
fn default_out_max() -> f64 {
    PID_OUT_MAX_DEFAULT
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: PID_GAIN_DEFAULT,
            ki: PID_GAIN_DEFAULT,
            kd: PID_GAIN_DEFAULT,
            out_min: PID_OUT_MIN_DEFAULT,
            out_max: PID_OUT_MAX_DEFAULT,
        }
    }
}

impl PidConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("kp", self.kp),
            ("ki", self.ki),
            ("kd", self.kd),
            ("out_min", self.out_min),
            ("out_max", self.out_max),
        ] {
            if !value.is_finite() {
                return Err(format!("pid {name} is not finite"));
            }
        }
        if self.out_min >= self.out_max {
            return Err(format!(
                "pid out_min {} must be below out_max {}",
                self.out_min, self.out_max
            ));
        }
        Ok(())
    }
}

// ─── Schedule Timepoint ─────────────────────────────────────────────

/// One step-function breakpoint: at `at` (wall clock), the target becomes
/// `target` until the next timepoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimepointConfig {
    /// Time of day, `"HH:MM:SS"`.
    pub at: NaiveTime,
    /// Target concentration (gas units).
    pub target: f64,
}
