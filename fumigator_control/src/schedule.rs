//! Time-of-day setpoint scheduler.
//!
//! A schedule is an ascending set of step-function breakpoints over the
//! 24-hour wall clock. The active target is the last breakpoint at or
//! before `now`; before the first breakpoint of the day, the latest
//! breakpoint carries over from the previous day, which yields midnight
//! wraparound without any date arithmetic.

use chrono::NaiveTime;

use fumigator_common::config::TimepointConfig;

/// Non-empty, time-sorted setpoint schedule for one gas loop.
#[derive(Debug, Clone)]
pub struct Schedule {
    entries: Vec<TimepointConfig>,
}

impl Schedule {
    /// Build a schedule, sorting entries by time of day.
    ///
    /// Rejects empty schedules and duplicate times, so resolution is
    /// total for every constructed value.
    pub fn new(mut entries: Vec<TimepointConfig>) -> Result<Self, String> {
        if entries.is_empty() {
            return Err("schedule needs at least one timepoint".to_string());
        }
        entries.sort_by_key(|tp| tp.at);
        for pair in entries.windows(2) {
            if pair[0].at == pair[1].at {
                return Err(format!("duplicate schedule timepoint {}", pair[0].at));
            }
        }
        Ok(Self { entries })
    }

    /// Resolve the active target at `now`.
    pub fn target_at(&self, now: NaiveTime) -> f64 {
        match self.entries.iter().rev().find(|tp| tp.at <= now) {
            Some(tp) => tp.target,
            // Before the first breakpoint: yesterday's last still holds.
            None => self.entries[self.entries.len() - 1].target,
        }
    }
}
