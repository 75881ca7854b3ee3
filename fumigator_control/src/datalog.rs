//! Append-only CSV cycle records.
//!
//! One growing file per chamber per calendar day:
//! `<data_dir>/chamber<channel>/<YYYY-MM-DD>.csv`, one record per control
//! cycle. Write failures are reported to the caller as errors; the
//! control loop treats them as non-fatal.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveTime};
use thiserror::Error;

/// Data-logging error. Always non-fatal to the control loop.
#[derive(Debug, Error)]
pub enum DatalogError {
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to append to {path}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One cycle's structured record. Field order is the file format.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleRecord {
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Registry channel (0-based); written 1-based for display.
    pub channel: u8,
    pub co2_conc: f64,
    pub co2_target: f64,
    pub co2_out: f64,
    pub o3_conc: f64,
    pub o3_target: f64,
    pub o3_out: f64,
}

impl CycleRecord {
    /// Stamp a record with the current local date and time.
    #[allow(clippy::too_many_arguments)]
    pub fn stamp_now(
        channel: u8,
        co2_conc: f64,
        co2_target: f64,
        co2_out: f64,
        o3_conc: f64,
        o3_target: f64,
        o3_out: f64,
    ) -> Self {
        let now = Local::now().naive_local();
        Self {
            date: now.date(),
            time: now.time(),
            channel,
            co2_conc,
            co2_target,
            co2_out,
            o3_conc,
            o3_target,
            o3_out,
        }
    }

    /// Serialize as one CSV line (no trailing newline).
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            self.date,
            self.time,
            self.channel + 1,
            self.co2_conc,
            self.co2_target,
            self.co2_out,
            self.o3_conc,
            self.o3_target,
            self.o3_out,
        )
    }

    /// Parse a line written by [`CycleRecord::to_csv_line`]. Used by
    /// read-back tooling; returns `None` on any malformed field.
    pub fn from_csv_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim_end().split(',').collect();
        if fields.len() != 9 {
            return None;
        }
        Some(Self {
            date: fields[0].parse().ok()?,
            time: fields[1].parse().ok()?,
            channel: fields[2].parse::<u8>().ok()?.checked_sub(1)?,
            co2_conc: fields[3].parse().ok()?,
            co2_target: fields[4].parse().ok()?,
            co2_out: fields[5].parse().ok()?,
            o3_conc: fields[6].parse().ok()?,
            o3_target: fields[7].parse().ok()?,
            o3_out: fields[8].parse().ok()?,
        })
    }
}

/// Appends cycle records under one data directory.
#[derive(Debug, Clone)]
pub struct DataLogger {
    root: PathBuf,
}

impl DataLogger {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the day file a record lands in.
    pub fn file_for(&self, record: &CycleRecord) -> PathBuf {
        self.root
            .join(format!("chamber{}", record.channel))
            .join(format!("{}.csv", record.date))
    }

    /// Append one record, creating the chamber directory on demand.
    /// Returns the file written.
    pub fn append(&self, record: &CycleRecord) -> Result<PathBuf, DatalogError> {
        let path = self.file_for(record);
        if let Some(dir) = path.parent() {
            ensure_dir(dir)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| DatalogError::Append {
                path: path.clone(),
                source,
            })?;
        writeln!(file, "{}", record.to_csv_line()).map_err(|source| DatalogError::Append {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn ensure_dir(dir: &Path) -> Result<(), DatalogError> {
    fs::create_dir_all(dir).map_err(|source| DatalogError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}
