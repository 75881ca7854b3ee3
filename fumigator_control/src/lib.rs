//! # Fumigator Control
//!
//! Closed-loop gas concentration control for growth chambers. One
//! single-threaded control loop samples each chamber in turn over the
//! shared sample line, runs one PID per controlled gas against a
//! time-of-day setpoint schedule, and hands the CO2 duty fraction to a
//! per-chamber valve task over a single-slot channel.
//!
//! ## Concurrency
//!
//! 1 orchestrator thread + N valve threads (one per chamber). The valve
//! tasks are decoupled from the orchestrator except through the
//! last-write-wins duty slot, and self-terminate via a miss-counter
//! watchdog when the slot goes quiet.

pub mod chamber;
pub mod config;
pub mod control;
pub mod datalog;
pub mod fumigate;
pub mod schedule;
pub mod slot;
pub mod valve;
