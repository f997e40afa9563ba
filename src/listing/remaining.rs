//! Remaining-time text parsing
//!
//! The item-detail endpoint reports the auction clock as short text such as
//! `"1d 4h"`, `"4h 12m"`, `"12m 30s"`, a bare number of seconds, or
//! `"Auction Ended"`. Buy-now listings report an empty string.

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

const ENDED_MARKERS: [&str; 2] = ["auction ended", "ended"];

/// Remaining auction time of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingTime {
    /// Auction clock is running; zero means the auction has concluded
    Countdown(Duration),
    /// Listing has no auction clock (buy-now listings)
    NoCountdown,
}

impl RemainingTime {
    /// Zero remaining time
    pub const fn ended() -> Self {
        Self::Countdown(Duration::ZERO)
    }

    /// Parse remaining-time text.
    ///
    /// Text that matches no known pattern is treated as zero remaining time.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::NoCountdown;
        }

        if ENDED_MARKERS
            .iter()
            .any(|marker| trimmed.eq_ignore_ascii_case(marker))
        {
            return Self::ended();
        }

        match parse_countdown(trimmed) {
            Some(duration) => Self::Countdown(duration),
            None => {
                tracing::warn!(text = trimmed, "Unrecognized remaining time, treating as ended");
                Self::ended()
            }
        }
    }

    /// Whether the auction has concluded
    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Countdown(d) if d.is_zero())
    }

    /// Remaining duration, if the listing has an auction clock
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Countdown(d) => Some(*d),
            Self::NoCountdown => None,
        }
    }
}

/// Parse `<N><unit>` tokens (units d/h/m/s) or a bare number of seconds.
///
/// Values too large for a `u64` of seconds saturate.
fn parse_countdown(text: &str) -> Option<Duration> {
    let mut chars = text.chars().peekable();
    let mut total: u64 = 0;
    let mut matched = false;

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut value: u64 = 0;
        let mut has_digits = false;
        while let Some(digit) = chars.next_if(|c| c.is_ascii_digit()) {
            value = value
                .saturating_mul(10)
                .saturating_add(u64::from(digit.to_digit(10)?));
            has_digits = true;
        }
        if !has_digits {
            return None;
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let unit_secs = match chars.next().map(|c| c.to_ascii_lowercase()) {
            // bare number
            None if !matched => return Some(Duration::from_secs(value)),
            Some('d') => 86_400,
            Some('h') => 3_600,
            Some('m') => 60,
            Some('s') => 1,
            _ => return None,
        };

        total = total.saturating_add(value.saturating_mul(unit_secs));
        matched = true;
    }

    matched.then(|| Duration::from_secs(total))
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = match self {
            Self::NoCountdown => return write!(f, "no countdown"),
            Self::Countdown(d) if d.is_zero() => return write!(f, "ended"),
            Self::Countdown(d) => d.as_secs(),
        };

        let parts = [
            (d / 86_400, 'd'),
            (d % 86_400 / 3_600, 'h'),
            (d % 3_600 / 60, 'm'),
            (d % 60, 's'),
        ];

        let mut first = true;
        for (value, unit) in parts.iter().filter(|(v, _)| *v > 0) {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}{}", value, unit)?;
            first = false;
        }
        Ok(())
    }
}

/// Serialized as remaining seconds, `null` when there is no auction clock
impl Serialize for RemainingTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Countdown(d) => serializer.serialize_some(&d.as_secs()),
            Self::NoCountdown => serializer.serialize_none(),
        }
    }
}
