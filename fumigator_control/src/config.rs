//! TOML configuration loader with validation and runtime reload.
//!
//! Startup loading fails fast on any I/O, parse, or validation error.
//! At runtime the [`ConfigReloader`] re-checks the file once per
//! chamber-cycle boundary and swaps in a validated snapshot, so schedule
//! and tuning edits take effect within one cycle without a restart. The
//! chamber set and the valve cycle period are latched at startup and are
//! not reloadable.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{info, warn};

use fumigator_common::config::FumigatorConfig;

// ─── Error Type ─────────────────────────────────────────────────────

/// Configuration loading/validation error.
#[derive(Debug)]
pub enum ConfigError {
    /// File I/O error.
    IoError(String),
    /// TOML parse error.
    ParseError(String),
    /// Parameter validation error.
    ValidationError(String),
    /// Reload changed a field that requires a restart.
    ReloadScopeViolation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "config I/O error: {e}"),
            Self::ParseError(e) => write!(f, "config parse error: {e}"),
            Self::ValidationError(e) => write!(f, "config validation: {e}"),
            Self::ReloadScopeViolation(detail) => {
                write!(f, "reload scope violation: {detail}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate the fumigator configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<FumigatorConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| {
        ConfigError::IoError(format!("failed to read {}: {e}", path.display()))
    })?;
    load_config_from_str(&text)
}

/// Load config from a TOML string (also used by tests).
pub fn load_config_from_str(text: &str) -> Result<FumigatorConfig, ConfigError> {
    let cfg: FumigatorConfig =
        toml::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    cfg.validate().map_err(ConfigError::ValidationError)?;
    Ok(cfg)
}

// ─── Reload Scope ───────────────────────────────────────────────────

/// Check that a reload candidate only changes reloadable fields.
///
/// **Reloadable**: PID gains and bounds, schedules, enable flags,
/// purge/sample durations, data directory.
///
/// **NOT reloadable** (require full restart): the chamber channel set and
/// `cycle_secs` — both are latched by the running valve tasks.
pub fn validate_reload_scope(
    active: &FumigatorConfig,
    candidate: &FumigatorConfig,
) -> Result<(), ConfigError> {
    if candidate.cycle_secs != active.cycle_secs {
        return Err(ConfigError::ReloadScopeViolation(format!(
            "cycle_secs changed: {} → {} (requires restart)",
            active.cycle_secs, candidate.cycle_secs,
        )));
    }

    let mut active_channels = active.channels();
    active_channels.sort_unstable();
    let mut candidate_channels = candidate.channels();
    candidate_channels.sort_unstable();
    if active_channels != candidate_channels {
        return Err(ConfigError::ReloadScopeViolation(format!(
            "chamber set changed: {active_channels:?} → {candidate_channels:?} (requires restart)",
        )));
    }

    Ok(())
}

// ─── Reloadable Snapshot ────────────────────────────────────────────

/// Versioned configuration snapshot, refreshed at cycle boundaries.
///
/// The whole document is re-read at once so a cycle never observes a
/// half-edited config.
pub struct ConfigReloader {
    path: PathBuf,
    active: FumigatorConfig,
    version: u64,
    last_modified: Option<SystemTime>,
}

impl ConfigReloader {
    /// Wrap an already-validated startup config.
    pub fn new(path: PathBuf, initial: FumigatorConfig) -> Self {
        let last_modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
        Self {
            path,
            active: initial,
            version: 1,
            last_modified,
        }
    }

    pub fn active(&self) -> &FumigatorConfig {
        &self.active
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Re-stat the file; on a new mtime, parse, validate, and scope-check
    /// a candidate and swap it in. A rejected candidate is discarded with
    /// a warning and the active snapshot stays in place.
    pub fn refresh(&mut self) -> (&FumigatorConfig, u64) {
        if let Ok(mtime) = fs::metadata(&self.path).and_then(|m| m.modified()) {
            if self.last_modified != Some(mtime) {
                self.last_modified = Some(mtime);
                self.reload();
            }
        }
        (&self.active, self.version)
    }

    fn reload(&mut self) {
        match load_config(&self.path) {
            Ok(candidate) => match validate_reload_scope(&self.active, &candidate) {
                Ok(()) if candidate != self.active => {
                    self.active = candidate;
                    self.version += 1;
                    info!("config reloaded (v{})", self.version);
                }
                Ok(()) => {}
                Err(e) => warn!("config reload rejected: {e}"),
            },
            Err(e) => warn!("config reload failed: {e}; keeping active config"),
        }
    }
}
