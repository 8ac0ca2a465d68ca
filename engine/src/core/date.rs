//! Delivery dates as lexically-ordered `YYYY-MM-DD` strings.
//!
//! Chronological ordering in this system is *string* ordering: `YYYY-MM-DD`
//! sorts lexically in date order, so dates are never parsed into calendar
//! types. This avoids timezone conversion entirely. The format is validated
//! once at the boundary; after construction an [`EventDate`] is trusted
//! everywhere.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when validating a date string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("date '{0}' is not in YYYY-MM-DD format")]
    Malformed(String),

    #[error("date '{0}' has an out-of-range month or day")]
    OutOfRange(String),
}

/// A validated `YYYY-MM-DD` delivery date.
///
/// Ordering is the ordering of the underlying string, which for this format
/// is the chronological ordering. That equivalence is a documented contract
/// of the whole engine: the cash chain and the balance fold both rely on it.
///
/// # Example
/// ```
/// use coop_cash_engine::core::date::EventDate;
///
/// let jan = EventDate::new("2026-01-01").unwrap();
/// let feb = EventDate::new("2026-02-01").unwrap();
/// assert!(jan < feb);
/// assert!(EventDate::new("01/02/2026").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EventDate(String);

impl EventDate {
    /// Validate and wrap a date string.
    pub fn new(raw: impl Into<String>) -> Result<Self, DateError> {
        let raw = raw.into();
        let bytes = raw.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return Err(DateError::Malformed(raw));
        }
        let digits_ok = bytes
            .iter()
            .enumerate()
            .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit());
        if !digits_ok {
            return Err(DateError::Malformed(raw));
        }

        // Coarse range check only; the engine does not model calendars.
        let month: u8 = raw[5..7].parse().map_err(|_| DateError::Malformed(raw.clone()))?;
        let day: u8 = raw[8..10].parse().map_err(|_| DateError::Malformed(raw.clone()))?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(DateError::OutOfRange(raw));
        }

        Ok(Self(raw))
    }

    /// The underlying `YYYY-MM-DD` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Deserialization goes through validation so malformed dates are rejected at
// the snapshot boundary, not deep inside a fold.
impl<'de> Deserialize<'de> for EventDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        EventDate::new(raw).map_err(serde::de::Error::custom)
    }
}
