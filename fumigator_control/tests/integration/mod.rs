mod common;

mod datalog_roundtrip;
mod duty_cycle;
mod end_to_end;
mod hot_reload;
