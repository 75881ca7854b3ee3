//! PID controller with conditional integration and output clamping.
//!
//! Anti-windup is the crude conditional form: the integral term
//! accumulates only while the *previous* cycle's clamped output sat
//! strictly inside `(out_min, out_max)`. At either bound the accumulator
//! is frozen (not decayed) until the output re-enters the open interval.
//! The gate testing the previous output gives the freeze a one-cycle lag;
//! that is the contract, not an accident.

use fumigator_common::config::PidConfig;

/// Stateful PID controller for one Chamber×Gas pair.
///
/// Exclusively owned; created at chamber construction and mutated only by
/// [`Pid::update`]. `set_params` re-tunes without clearing history.
#[derive(Debug, Clone, Copy)]
pub struct Pid {
    target: f64,
    kp: f64,
    ki: f64,
    kd: f64,
    out_min: f64,
    out_max: f64,
    last_input: f64,
    integral: f64,
    last_output: f64,
}

impl Pid {
    /// Create a controller from validated tuning, target 0.
    ///
    /// Caller guarantees `cfg.out_min < cfg.out_max` (config validation).
    pub fn new(cfg: PidConfig) -> Self {
        Self {
            target: 0.0,
            kp: cfg.kp,
            ki: cfg.ki,
            kd: cfg.kd,
            out_min: cfg.out_min,
            out_max: cfg.out_max,
            last_input: 0.0,
            integral: 0.0,
            last_output: 0.0,
        }
    }

    /// Current setpoint.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Last clamped output.
    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Overwrite target, gains, and bounds. The integral accumulator and
    /// the remembered input survive, so a re-tune does not bump the output.
    pub fn set_params(&mut self, target: f64, cfg: PidConfig) {
        self.target = target;
        self.kp = cfg.kp;
        self.ki = cfg.ki;
        self.kd = cfg.kd;
        self.out_min = cfg.out_min;
        self.out_max = cfg.out_max;
    }

    /// Compute one control cycle and return the clamped output.
    pub fn update(&mut self, input: f64) -> f64 {
        let error = input - self.target;

        let p = self.kp * error;

        // Gate on the previous clamped output, strict on both bounds.
        if self.last_output > self.out_min && self.last_output < self.out_max {
            self.integral += self.ki * error;
        }

        let d = self.kd * (input - self.last_input);
        self.last_input = input;

        self.last_output = (p + self.integral + d).clamp(self.out_min, self.out_max);
        self.last_output
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
