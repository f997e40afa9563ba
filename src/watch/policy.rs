//! Poll interval policy
//!
//! Maps the remaining auction time to how often a listing is re-polled.
//! Listings far from their deadline are polled rarely; listings about to
//! close are polled every few seconds.

use crate::listing::RemainingTime;
use std::time::Duration;

/// Thresholds from largest to smallest; first `remaining > threshold` wins
const INTERVAL_TABLE: [(Duration, u64); 6] = [
    (Duration::from_secs(86_400), 7200), // 1 day: 2 hours
    (Duration::from_secs(43_200), 3600), // 12 hours: 1 hour
    (Duration::from_secs(3_600), 1800),  // 1 hour: 30 minutes
    (Duration::from_secs(1_800), 900),   // 30 minutes: 15 minutes
    (Duration::from_secs(900), 60),      // 15 minutes: 1 minute
    (Duration::from_secs(300), 30),      // 5 minutes: 30 seconds
];

/// Interval for listings with five minutes or less remaining
pub const MIN_INTERVAL_SECS: u64 = 10;

/// Default interval for listings without an auction clock
pub const DEFAULT_NO_COUNTDOWN_INTERVAL_SECS: u64 = 3600;

/// Poll interval in seconds for a remaining auction time
pub fn poll_interval(remaining: Duration) -> u64 {
    INTERVAL_TABLE
        .iter()
        .find(|(threshold, _)| remaining > *threshold)
        .map(|(_, interval)| *interval)
        .unwrap_or(MIN_INTERVAL_SECS)
}

/// Interval policy covering listings with and without an auction clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPolicy {
    no_countdown_secs: u64,
}

impl IntervalPolicy {
    /// Intervals below [`MIN_INTERVAL_SECS`] are raised to it
    pub fn new(no_countdown_secs: u64) -> Self {
        if no_countdown_secs < MIN_INTERVAL_SECS {
            tracing::warn!(
                configured = no_countdown_secs,
                min = MIN_INTERVAL_SECS,
                "No-countdown interval below minimum, clamping"
            );
        }
        Self {
            no_countdown_secs: no_countdown_secs.max(MIN_INTERVAL_SECS),
        }
    }

    pub fn no_countdown_secs(&self) -> u64 {
        self.no_countdown_secs
    }

    /// Poll interval in seconds for a listing's remaining time
    pub fn interval_for(&self, remaining: &RemainingTime) -> u64 {
        match remaining {
            RemainingTime::Countdown(d) => poll_interval(*d),
            RemainingTime::NoCountdown => self.no_countdown_secs,
        }
    }
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_NO_COUNTDOWN_INTERVAL_SECS)
    }
}
