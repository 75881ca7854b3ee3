//! CSV record round trip across simulated days.
//!
//! A record written through the logger and read back from the day file
//! yields the same nine fields in the same order.

use std::fs;

use chrono::{NaiveDate, NaiveTime};

use fumigator_control::datalog::{CycleRecord, DataLogger};

fn record_on(date: NaiveDate) -> CycleRecord {
    CycleRecord {
        date,
        time: NaiveTime::from_hms_opt(14, 5, 0).unwrap(),
        channel: 1,
        co2_conc: 598.75,
        co2_target: 600.0,
        co2_out: 0.3125,
        o3_conc: 42.0,
        o3_target: 100.0,
        o3_out: 0.0,
    }
}

#[test]
fn one_record_per_simulated_day_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let logger = DataLogger::new(dir.path());

    let days = [
        NaiveDate::from_ymd_opt(2014, 2, 21).unwrap(),
        NaiveDate::from_ymd_opt(2014, 2, 22).unwrap(),
    ];

    for date in days {
        let record = record_on(date);
        let path = logger.append(&record).unwrap();
        assert!(path.ends_with(format!("chamber1/{date}.csv")));

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);

        let read_back = CycleRecord::from_csv_line(lines[0]).unwrap();
        assert_eq!(read_back, record);

        // Field order on disk: date, time, display channel, CO2 triple,
        // O3 triple.
        let fields: Vec<&str> = lines[0].split(',').collect();
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0], date.to_string());
        assert_eq!(fields[1], "14:05:00");
        assert_eq!(fields[2], "2");
    }
}
