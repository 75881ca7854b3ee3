//! Two-chamber end-to-end pass against the simulation DAQ.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use fumigator_common::daq::sim::SimDaq;
use fumigator_common::daq::DaqDevice;
use fumigator_common::gas::Gas;
use fumigator_control::chamber::build_registry;
use fumigator_control::config::{ConfigReloader, load_config};
use fumigator_control::datalog::CycleRecord;
use fumigator_control::fumigate;

fn write_two_chamber_config(dir: &Path) -> PathBuf {
    let data_dir = dir.join("data");
    let toml_text = format!(
        r#"
data_dir = "{}"
purge_secs = 0.05
sample_secs = 0.0
cycle_secs = 0.2

[[chambers]]
channel = 0
[chambers.co2]
schedule = [{{ at = "00:00:00", target = 400.0 }}]

[[chambers]]
channel = 1
[chambers.co2]
schedule = [{{ at = "00:00:00", target = 400.0 }}]
"#,
        data_dir.display()
    );
    let path = dir.join("fumigator.toml");
    fs::write(&path, toml_text).unwrap();
    path
}

#[test]
fn one_pass_logs_one_record_per_chamber() {
    let dir = tempfile::tempdir().unwrap();
    let cfg_path = write_two_chamber_config(dir.path());
    let cfg = load_config(&cfg_path).unwrap();

    let sim = SimDaq::new();
    sim.set_voltage(Gas::Co2.adc_channel(), 1.0); // reads as 400 ppm
    sim.set_voltage(Gas::O3.adc_channel(), 0.0);

    let mut registry = build_registry(&cfg, &sim).unwrap();
    let mut dev = sim.try_clone().unwrap();
    let mut reloader = ConfigReloader::new(cfg_path, cfg);
    let running = AtomicBool::new(true);

    fumigate::pass(&mut registry, dev.as_mut(), &mut reloader, &running);

    for channel in [0u8, 1] {
        let chamber_dir = dir.path().join("data").join(format!("chamber{channel}"));
        let files: Vec<_> = fs::read_dir(&chamber_dir)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(files.len(), 1, "chamber {channel}: expected one day file");

        let contents = fs::read_to_string(files[0].path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1, "chamber {channel}: expected one record");

        let record = CycleRecord::from_csv_line(lines[0]).unwrap();
        assert_eq!(record.channel, channel);
        assert_eq!(record.co2_target, 400.0);
        assert_eq!(record.co2_conc, 400.0);
        assert!((0.0..=1.0).contains(&record.co2_out));
        assert_eq!(record.o3_target, 0.0);
        assert_eq!(record.o3_out, 0.0);
    }

    // Both valve tasks are alive, and the sample line was routed once per
    // chamber (channel bit low for chamber 0, high for chamber 1).
    assert!(registry.values().all(|c| c.valve_running()));
    let line_writes = sim.transitions_for(3);
    assert_eq!(line_writes.len(), 2);
    assert!(!line_writes[0].state);
    assert!(line_writes[1].state);
}

#[test]
fn empty_registry_returns_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("fumigator.toml");
    fs::write(&cfg_path, "purge_secs = 0.0\nsample_secs = 0.0\n").unwrap();
    let cfg = load_config(&cfg_path).unwrap();

    let sim = SimDaq::new();
    let mut registry = build_registry(&cfg, &sim).unwrap();
    assert!(registry.is_empty());

    let mut dev = sim.try_clone().unwrap();
    let mut reloader = ConfigReloader::new(cfg_path, cfg);
    let running = AtomicBool::new(true);

    // Returns instead of spinning on nothing.
    fumigate::run(&mut registry, dev.as_mut(), &mut reloader, &running);
}
