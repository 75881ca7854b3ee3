//! # Fumigator Control
//!
//! Closed-loop CO2/O3 concentration control daemon for growth chambers.
//!
//! Startup: load and validate the TOML config, open the DAQ driver,
//! build the chamber registry (one valve task per chamber), then enter
//! the sequential fumigation loop until ctrl-c. Config edits are picked
//! up at the next chamber-cycle boundary without a restart.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use fumigator_common::daq;
use fumigator_control::chamber::build_registry;
use fumigator_control::config::{ConfigReloader, load_config};
use fumigator_control::fumigate;

/// Fumigator Control — chamber gas concentration control loop
#[derive(Parser, Debug)]
#[command(name = "fumigator_control")]
#[command(version)]
#[command(about = "Closed-loop CO2/O3 fumigation control for growth chambers")]
struct Args {
    /// Path to the fumigator configuration TOML.
    #[arg(default_value = "config/fumigator.toml")]
    config: PathBuf,

    /// DAQ driver backend ("sim" is the only in-tree driver).
    #[arg(long, default_value = "sim")]
    driver: String,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("Fumigator Control v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Fumigator Control shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = load_config(&args.config)?;
    info!(
        "Config OK: {} chambers, purge={}s, sample={}s, valve cycle={}s",
        cfg.chambers.len(),
        cfg.purge_secs,
        cfg.sample_secs,
        cfg.cycle_secs,
    );

    let mut dev = daq::create_driver(&args.driver)?;
    info!("DAQ driver '{}' ready", dev.name());

    let mut registry = build_registry(&cfg, dev.as_ref())?;
    info!("{} valve tasks launched", registry.len());

    let mut reloader = ConfigReloader::new(args.config.clone(), cfg);

    // Setup signal handler for graceful shutdown.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    fumigate::run(&mut registry, dev.as_mut(), &mut reloader, &running);

    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
