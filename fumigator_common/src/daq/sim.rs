//! Simulation DAQ driver.
//!
//! Software stand-in for the multifunction I/O device: analog channels
//! return programmable voltages, digital writes are recorded with
//! timestamps. Cloned handles share one underlying device state, so a
//! test can inspect everything the orchestrator and the valve tasks did.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::{DaqDevice, DaqError};

/// One recorded digital-output write.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub channel: u8,
    pub state: bool,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct SimState {
    voltages: Mutex<HashMap<u8, f64>>,
    transitions: Mutex<Vec<Transition>>,
    fail_analog: AtomicBool,
    fail_digital: AtomicBool,
}

/// Simulation driver implementing the [`DaqDevice`] trait.
#[derive(Debug, Clone, Default)]
pub struct SimDaq {
    inner: Arc<SimState>,
}

impl SimDaq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program the voltage an analog channel will report (default 0.0 V).
    pub fn set_voltage(&self, channel: u8, volts: f64) {
        self.inner
            .voltages
            .lock()
            .expect("sim voltage lock poisoned")
            .insert(channel, volts);
    }

    /// All digital writes observed so far, in order.
    pub fn transitions(&self) -> Vec<Transition> {
        self.inner
            .transitions
            .lock()
            .expect("sim transition lock poisoned")
            .clone()
    }

    /// Digital writes on one channel, in order.
    pub fn transitions_for(&self, channel: u8) -> Vec<Transition> {
        self.transitions()
            .into_iter()
            .filter(|t| t.channel == channel)
            .collect()
    }

    /// Fault injection: make every analog read fail.
    pub fn fail_analog_reads(&self, fail: bool) {
        self.inner.fail_analog.store(fail, Ordering::SeqCst);
    }

    /// Fault injection: make every digital write fail.
    pub fn fail_digital_writes(&self, fail: bool) {
        self.inner.fail_digital.store(fail, Ordering::SeqCst);
    }
}

impl DaqDevice for SimDaq {
    fn name(&self) -> &'static str {
        "sim"
    }

    fn analog_in(&mut self, channel: u8) -> Result<f64, DaqError> {
        if self.inner.fail_analog.load(Ordering::SeqCst) {
            return Err(DaqError::ReadFailed {
                channel,
                reason: "injected fault".to_string(),
            });
        }
        Ok(self
            .inner
            .voltages
            .lock()
            .expect("sim voltage lock poisoned")
            .get(&channel)
            .copied()
            .unwrap_or(0.0))
    }

    fn digital_out(&mut self, channel: u8, state: bool) -> Result<(), DaqError> {
        if self.inner.fail_digital.load(Ordering::SeqCst) {
            return Err(DaqError::WriteFailed {
                channel,
                reason: "injected fault".to_string(),
            });
        }
        self.inner
            .transitions
            .lock()
            .expect("sim transition lock poisoned")
            .push(Transition {
                channel,
                state,
                at: Instant::now(),
            });
        Ok(())
    }

    fn try_clone(&self) -> Result<Box<dyn DaqDevice>, DaqError> {
        Ok(Box::new(self.clone()))
    }
}
