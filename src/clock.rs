//! Time source for commit stamping
//!
//! Timestamps are whole unix seconds. The engine never calls `Utc::now()`
//! directly so that commits can be replayed against a fixed clock.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{ChronicleError, ChronicleResult};

/// Unix timestamp in seconds
pub type Timestamp = i64;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, at: Timestamp) {
        self.now.store(at, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Convert a timestamp to a UTC datetime, rejecting out-of-range values
pub fn to_datetime(at: Timestamp) -> ChronicleResult<DateTime<Utc>> {
    DateTime::from_timestamp(at, 0).ok_or(ChronicleError::InvalidEffectiveTime(at))
}

/// Parse a `YYYY-MM-DD` date as midnight UTC
pub fn parse_date(s: &str) -> ChronicleResult<Timestamp> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
        ChronicleError::Validation(format!("Invalid date '{}': {}", s, e))
    })?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| ChronicleError::Validation(format!("Invalid date '{}'", s)))
}

/// Format a timestamp for display
pub fn format_timestamp(at: Timestamp) -> String {
    match DateTime::from_timestamp(at, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => at.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now(), 1_000);
        clock.advance(5);
        assert_eq!(clock.now(), 1_005);
        clock.set(10);
        assert_eq!(clock.now(), 10);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("1970-01-02").unwrap(), 86_400);
        assert!(parse_date("not a date").is_err());
    }

    #[test]
    fn test_to_datetime_rejects_out_of_range() {
        assert!(to_datetime(0).is_ok());
        assert!(matches!(
            to_datetime(i64::MAX),
            Err(ChronicleError::InvalidEffectiveTime(_))
        ));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
    }
}
