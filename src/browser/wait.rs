use std::thread;
use std::time::{Duration, Instant};

use crate::browser::driver::DriverError;

/// Poll `probe` every `interval` until it yields a value or `timeout` elapses.
///
/// The probe always runs at least once, so a zero timeout is a single check.
/// Driver errors abort the wait immediately.
pub fn poll_until<T>(
    timeout: Duration,
    interval: Duration,
    mut probe: impl FnMut() -> Result<Option<T>, DriverError>,
) -> Result<Option<T>, DriverError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe()? {
            return Ok(Some(value));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(interval.min(deadline - now));
    }
}

pub fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
