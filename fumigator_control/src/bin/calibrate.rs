//! Analyser calibration readout.
//!
//! Continuously samples both gas channels and prints the current
//! concentrations while the analysers are being adjusted. No control
//! loop runs; the DAQ is used read-only.

use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use fumigator_common::consts::DURATION_SECS_MAX;
use fumigator_common::daq::{self, sample_mean};
use fumigator_common::gas::{ALL_GASES, Gas};

/// Fumigator calibration readout
#[derive(Parser, Debug)]
#[command(name = "calibrate")]
#[command(version)]
#[command(about = "Live CO2/O3 concentration readout for analyser calibration")]
struct Args {
    /// DAQ driver backend ("sim" is the only in-tree driver).
    #[arg(long, default_value = "sim")]
    driver: String,

    /// Averaging window per readout [s].
    #[arg(long, default_value_t = 0.5)]
    sample_secs: f64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .init();

    if let Err(e) = run(&Args::parse()) {
        error!("FATAL: {e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=DURATION_SECS_MAX).contains(&args.sample_secs) {
        return Err(format!(
            "sample_secs {} out of range [0, {DURATION_SECS_MAX}]",
            args.sample_secs
        )
        .into());
    }

    let mut dev = daq::create_driver(&args.driver)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))?;

    let window = Duration::from_secs_f64(args.sample_secs);
    while running.load(Ordering::SeqCst) {
        let means = sample_mean(dev.as_mut(), &ALL_GASES, window)?;
        println!(
            "CO2: {:.0} {}, O3: {:.0} {}",
            means[&Gas::Co2],
            Gas::Co2.unit(),
            means[&Gas::O3],
            Gas::O3.unit(),
        );
    }
    Ok(())
}
