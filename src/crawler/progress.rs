//! Progress and speed accounting — pure functions over elapsed time and counts.

use std::time::Instant;

/// Minimum elapsed minutes before a speed is reported
///
/// Below this the sample is too small to be meaningful and the division
/// produces absurd numbers on fresh starts.
const MIN_ELAPSED_MINUTES: f64 = 0.1;

/// Average crawl speed in articles per minute, rounded to one decimal
///
/// Returns 0.0 within the first six seconds regardless of the count.
pub fn speed(crawled: u64, started: Instant) -> f64 {
    let elapsed_minutes = started.elapsed().as_secs_f64() / 60.0;
    if elapsed_minutes < MIN_ELAPSED_MINUTES {
        return 0.0;
    }
    (crawled as f64 / elapsed_minutes * 10.0).round() / 10.0
}

/// Estimated whole minutes until the pending set drains at the given speed
///
/// Zero when the speed is unknown or nothing is pending.
pub fn estimated_minutes_remaining(pending: u64, speed: f64) -> u64 {
    if speed > 0.0 && pending > 0 {
        (pending as f64 / speed).ceil() as u64
    } else {
        0
    }
}
