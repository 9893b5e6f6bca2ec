//! Delay growth between status poll rounds.

use std::time::Duration;

use crate::config::PollConfig;

/// Calculate the next poll delay from the current delay and config.
///
/// The result is clamped to [`PollConfig::max_interval`]. A multiplier
/// below `1.0` is treated as `1.0` so the delay never shrinks.
pub fn next_delay(current: Duration, config: &PollConfig) -> Duration {
    let multiplier = config.multiplier.max(1.0);
    let next_ms = (current.as_millis() as f64 * multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_interval)
}
