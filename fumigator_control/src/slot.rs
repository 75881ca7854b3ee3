//! Single-slot duty-command channel.
//!
//! The orchestrator→valve link only ever needs the freshest duty
//! fraction, so this is a mailbox, not a queue: at most one unread value,
//! send overwrites and never blocks, poll takes or returns empty.

use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Slot {
    value: Mutex<Option<f64>>,
}

impl Slot {
    fn lock(&self) -> std::sync::MutexGuard<'_, Option<f64>> {
        // A poisoned slot still holds a plain f64; keep going.
        self.value.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Orchestrator side: overwrite-on-send.
#[derive(Debug, Clone)]
pub struct DutySender {
    slot: Arc<Slot>,
}

/// Valve-task side: non-blocking take.
#[derive(Debug)]
pub struct DutyReceiver {
    slot: Arc<Slot>,
}

/// Create a connected sender/receiver pair.
pub fn duty_slot() -> (DutySender, DutyReceiver) {
    let slot = Arc::new(Slot::default());
    (
        DutySender { slot: slot.clone() },
        DutyReceiver { slot },
    )
}

impl DutySender {
    /// Post a duty fraction, replacing any unread value.
    pub fn send(&self, duty: f64) {
        *self.slot.lock() = Some(duty);
    }
}

impl DutyReceiver {
    /// Take the pending value, if any.
    pub fn poll(&self) -> Option<f64> {
        self.slot.lock().take()
    }
}
