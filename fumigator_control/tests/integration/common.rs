//! Shared helpers for the integration suite.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Poll a thread handle until it finishes or `timeout` elapses.
pub fn wait_finished(handle: &JoinHandle<()>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if handle.is_finished() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    handle.is_finished()
}
