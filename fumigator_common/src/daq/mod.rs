//! Data-acquisition device trait and helpers.
//!
//! This module defines:
//! - `DaqDevice` trait - Interface for pluggable DAQ backends
//! - `DaqError` enum - Error types for DAQ operations
//! - `sample_mean` - Windowed gas-concentration averaging
//! - `create_driver` - Driver lookup by name
//!
//! The orchestrator thread owns one device handle exclusively for the
//! sensor path; each valve task opens its own handle via [`DaqDevice::try_clone`]
//! and touches only its chamber's solenoid channel.

pub mod sim;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::warn;

use crate::consts::SAMPLE_RETRY_LIMIT;
use crate::gas::Gas;

/// Error types for DAQ operations.
#[derive(Debug, Clone, Error)]
pub enum DaqError {
    /// Analog acquisition failed.
    #[error("analog read failed on channel {channel}: {reason}")]
    ReadFailed { channel: u8, reason: String },

    /// Digital output failed.
    #[error("digital write failed on channel {channel}: {reason}")]
    WriteFailed { channel: u8, reason: String },

    /// No driver registered under the requested name.
    #[error("DAQ driver not found: {0}")]
    DriverNotFound(String),
}

/// Trait defining the interface for DAQ backends.
///
/// Implementations wrap one connection to a multifunction I/O device
/// (analog inputs for the gas analysers, digital outputs for the
/// sample-line valve and the chamber solenoids).
pub trait DaqDevice: Send + std::fmt::Debug {
    /// Returns the driver's unique identifier (e.g., "sim").
    fn name(&self) -> &'static str;

    /// Read one raw voltage from an analog input channel.
    fn analog_in(&mut self, channel: u8) -> Result<f64, DaqError>;

    /// Drive a digital output channel.
    fn digital_out(&mut self, channel: u8, state: bool) -> Result<(), DaqError>;

    /// Open a second handle to the same device, for a valve task that
    /// needs its own connection.
    fn try_clone(&self) -> Result<Box<dyn DaqDevice>, DaqError>;
}

/// Create a DAQ driver instance by name.
///
/// # Errors
/// Returns `DaqError::DriverNotFound` for an unknown name.
pub fn create_driver(name: &str) -> Result<Box<dyn DaqDevice>, DaqError> {
    match name {
        "sim" => Ok(Box::new(sim::SimDaq::new())),
        other => Err(DaqError::DriverNotFound(other.to_string())),
    }
}

/// Sample the given gas channels once per second until `window` elapses
/// and return the arithmetic mean concentration per gas.
///
/// At least one sample is always taken; a zero window degenerates to a
/// single instantaneous reading. Each raw read is retried up to
/// [`SAMPLE_RETRY_LIMIT`] times before the window is abandoned.
pub fn sample_mean(
    dev: &mut dyn DaqDevice,
    gases: &[Gas],
    window: Duration,
) -> Result<HashMap<Gas, f64>, DaqError> {
    let start = Instant::now();
    let mut sums = vec![0.0_f64; gases.len()];
    let mut count = 0u32;

    loop {
        for (i, gas) in gases.iter().enumerate() {
            let volts = read_with_retry(dev, gas.adc_channel())?;
            sums[i] += volts * gas.scale();
        }
        count += 1;

        let elapsed = start.elapsed();
        if elapsed >= window {
            break;
        }
        std::thread::sleep((window - elapsed).min(Duration::from_secs(1)));
    }

    Ok(gases
        .iter()
        .zip(sums)
        .map(|(gas, sum)| (*gas, sum / f64::from(count)))
        .collect())
}

fn read_with_retry(dev: &mut dyn DaqDevice, channel: u8) -> Result<f64, DaqError> {
    let mut last_err = None;
    for attempt in 1..=SAMPLE_RETRY_LIMIT {
        match dev.analog_in(channel) {
            Ok(volts) => return Ok(volts),
            Err(e) => {
                warn!("analog read attempt {attempt}/{SAMPLE_RETRY_LIMIT} failed: {e}");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or(DaqError::ReadFailed {
        channel,
        reason: "no attempts made".to_string(),
    }))
}
