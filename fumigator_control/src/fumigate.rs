//! Top-level fumigation loop.
//!
//! Cycles every registered chamber in ascending channel order, forever,
//! while at least one chamber exists and the shutdown flag stays set.
//! Chambers share one sample line, so cycles are strictly sequential; a
//! failure in one chamber's cycle never aborts the others.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};

use fumigator_common::daq::DaqDevice;

use crate::chamber::ChamberRegistry;
use crate::config::ConfigReloader;

/// Run the fumigation loop until shutdown or an empty registry.
pub fn run(
    registry: &mut ChamberRegistry,
    dev: &mut dyn DaqDevice,
    reloader: &mut ConfigReloader,
    running: &AtomicBool,
) {
    info!("fumigation loop started ({} chambers)", registry.len());
    while !registry.is_empty() && running.load(Ordering::SeqCst) {
        pass(registry, dev, reloader, running);
    }
    info!("fumigation loop finished");
}

/// One full pass over the registry.
///
/// The config snapshot is refreshed at each chamber-cycle boundary, so an
/// edit takes effect within one cycle without mid-cycle inconsistency.
pub fn pass(
    registry: &mut ChamberRegistry,
    dev: &mut dyn DaqDevice,
    reloader: &mut ConfigReloader,
    running: &AtomicBool,
) {
    for (&channel, chamber) in registry.iter_mut() {
        if !running.load(Ordering::SeqCst) {
            return;
        }

        let (cfg, version) = reloader.refresh();
        if let Some(chamber_cfg) = cfg.chambers.iter().find(|c| c.channel == channel) {
            if let Err(e) = chamber.apply_config(chamber_cfg, version) {
                warn!("chamber {}: config apply failed: {e}", channel + 1);
            }
        }

        if let Err(e) = chamber.run_cycle(dev, cfg) {
            error!("chamber {}: cycle failed: {e}", channel + 1);
        }
    }
}
