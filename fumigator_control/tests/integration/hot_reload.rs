//! Config reload through the fumigation loop.
//!
//! A schedule/tuning edit lands at the next chamber-cycle boundary; an
//! edit touching the chamber set is rejected and the active snapshot
//! stays in place.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::{Duration, SystemTime};

use fumigator_common::daq::sim::SimDaq;
use fumigator_common::daq::DaqDevice;
use fumigator_common::gas::Gas;
use fumigator_control::chamber::build_registry;
use fumigator_control::config::{ConfigReloader, load_config};
use fumigator_control::datalog::CycleRecord;
use fumigator_control::fumigate;

fn config_toml(data_dir: &Path, body: &str) -> String {
    format!(
        r#"
data_dir = "{}"
purge_secs = 0.0
sample_secs = 0.0
cycle_secs = 0.2
{body}
"#,
        data_dir.display()
    )
}

fn chamber_body(target: f64) -> String {
    format!(
        r#"
[[chambers]]
channel = 0
[chambers.co2]
schedule = [{{ at = "00:00:00", target = {target} }}]
"#
    )
}

fn rewrite_config(path: &Path, text: &str, offset_secs: u64) {
    fs::write(path, text).unwrap();
    // Force a distinct mtime for coarse filesystem clocks.
    let file = fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
        .unwrap();
}

fn records_for_chamber0(data_dir: &Path) -> Vec<CycleRecord> {
    let chamber_dir = data_dir.join("chamber0");
    let mut files: Vec<PathBuf> = fs::read_dir(&chamber_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    files
        .iter()
        .flat_map(|f| {
            fs::read_to_string(f)
                .unwrap()
                .lines()
                .map(|l| CycleRecord::from_csv_line(l).unwrap())
                .collect::<Vec<_>>()
        })
        .collect()
}

#[test]
fn schedule_edit_applies_at_next_cycle_and_scope_violations_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let cfg_path = dir.path().join("fumigator.toml");
    fs::write(&cfg_path, config_toml(&data_dir, &chamber_body(400.0))).unwrap();

    let cfg = load_config(&cfg_path).unwrap();
    let sim = SimDaq::new();
    sim.set_voltage(Gas::Co2.adc_channel(), 1.0);

    let mut registry = build_registry(&cfg, &sim).unwrap();
    let mut dev = sim.try_clone().unwrap();
    let mut reloader = ConfigReloader::new(cfg_path.clone(), cfg);
    let running = AtomicBool::new(true);

    // Pass 1: original target.
    fumigate::pass(&mut registry, dev.as_mut(), &mut reloader, &running);

    // Edit the setpoint; pass 2 must control against it.
    rewrite_config(&cfg_path, &config_toml(&data_dir, &chamber_body(650.0)), 2);
    fumigate::pass(&mut registry, dev.as_mut(), &mut reloader, &running);
    assert_eq!(reloader.version(), 2);

    // Edit the chamber set; the reload is rejected, pass 3 keeps v2.
    let grown = config_toml(
        &data_dir,
        &format!("{}{}", chamber_body(650.0), r#"
[[chambers]]
channel = 1
[chambers.co2]
schedule = [{ at = "00:00:00", target = 650.0 }]
"#),
    );
    rewrite_config(&cfg_path, &grown, 4);
    fumigate::pass(&mut registry, dev.as_mut(), &mut reloader, &running);
    assert_eq!(reloader.version(), 2);
    assert_eq!(registry.len(), 1);

    let records = records_for_chamber0(&data_dir);
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].co2_target, 400.0);
    assert_eq!(records[1].co2_target, 650.0);
    assert_eq!(records[2].co2_target, 650.0);
}
