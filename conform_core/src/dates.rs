//! Day-offset arithmetic and status strings for onboarding dates.
//!
//! Everything here is a pure function of its inputs. "Now" is always passed
//! explicitly; [`StatusFormatter::wall_clock`] is the only place that reads the
//! system clock.
//!
//! ```rust
//! use conform_core::dates::StatusFormatter;
//!
//! let fmt = StatusFormatter::at_str("2025-10-29").unwrap();
//! assert_eq!(fmt.due_status("2025-11-02").unwrap(), "Due in 4 days");
//! assert_eq!(fmt.connected_status("2025-10-28").unwrap(), "1 day connected");
//! ```

use crate::error::ConformError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

pub const MS_PER_DAY: i64 = 86_400_000;

/// Default look-ahead for [`is_due_soon`].
pub const DEFAULT_DUE_SOON_DAYS: i64 = 7;

/// Parses an ISO-8601 date or date-time.
///
/// A bare `YYYY-MM-DD` is midnight UTC. Timestamps without an offset are
/// taken as UTC.
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>, ConformError> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(ConformError::DateParse(input.to_string()))
}

/// Whole days until `target`, rounded up: 12 hours ahead is `1`.
pub fn days_remaining(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let diff = (target - now).num_milliseconds();
    diff.div_euclid(MS_PER_DAY) + i64::from(diff.rem_euclid(MS_PER_DAY) != 0)
}

/// Whole days elapsed since `start`, rounded down.
pub fn days_since(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - start).num_milliseconds().div_euclid(MS_PER_DAY)
}

pub fn format_due_status(days: i64) -> String {
    match days {
        d if d < 0 => format!("{} days overdue", d.unsigned_abs()),
        0 => "Due today".to_string(),
        1 => "Due tomorrow".to_string(),
        d => format!("Due in {} days", d),
    }
}

/// Negative input (a connection date in the future) passes through unchanged,
/// e.g. `-2 days connected`.
pub fn format_connected_status(days: i64) -> String {
    match days {
        0 => "Connected today".to_string(),
        1 => "1 day connected".to_string(),
        d => format!("{} days connected", d),
    }
}

pub fn format_nudge_status(days: i64) -> String {
    match days {
        d if d < 0 => "OVERDUE".to_string(),
        0 => "NOTIFYING TODAY".to_string(),
        1 => "NOTIFYING TOMORROW".to_string(),
        d => format!("NOTIFYING IN {} DAYS", d),
    }
}

/// True when the due date is today or within `threshold_days` ahead.
pub fn is_due_soon(due: DateTime<Utc>, now: DateTime<Utc>, threshold_days: i64) -> bool {
    let days = days_remaining(due, now);
    (0..=threshold_days).contains(&days)
}

pub fn is_overdue(due: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    days_remaining(due, now) < 0
}

/// Formats ISO date strings relative to a fixed "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFormatter {
    now: DateTime<Utc>,
    due_soon_days: i64,
}

impl StatusFormatter {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            due_soon_days: DEFAULT_DUE_SOON_DAYS,
        }
    }

    pub fn at_str(now: &str) -> Result<Self, ConformError> {
        parse_instant(now).map(Self::at)
    }

    pub fn wall_clock() -> Self {
        Self::at(Utc::now())
    }

    pub fn with_due_soon_days(mut self, days: i64) -> Self {
        self.due_soon_days = days;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn due_soon_days(&self) -> i64 {
        self.due_soon_days
    }

    pub fn days_remaining(&self, target: &str) -> Result<i64, ConformError> {
        Ok(days_remaining(parse_instant(target)?, self.now))
    }

    pub fn days_since(&self, start: &str) -> Result<i64, ConformError> {
        Ok(days_since(parse_instant(start)?, self.now))
    }

    pub fn due_status(&self, due: &str) -> Result<String, ConformError> {
        self.days_remaining(due).map(format_due_status)
    }

    pub fn nudge_status(&self, nudge: &str) -> Result<String, ConformError> {
        self.days_remaining(nudge).map(format_nudge_status)
    }

    pub fn connected_status(&self, connected: &str) -> Result<String, ConformError> {
        self.days_since(connected).map(format_connected_status)
    }

    pub fn is_due_soon(&self, due: &str) -> Result<bool, ConformError> {
        Ok(is_due_soon(parse_instant(due)?, self.now, self.due_soon_days))
    }

    pub fn is_overdue(&self, due: &str) -> Result<bool, ConformError> {
        Ok(is_overdue(parse_instant(due)?, self.now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(input: &str) -> DateTime<Utc> {
        parse_instant(input).unwrap()
    }

    #[test]
    fn test_days_remaining_whole_days() {
        assert_eq!(days_remaining(at("2025-11-02"), at("2025-10-29")), 4);
        assert_eq!(days_remaining(at("2025-10-29"), at("2025-10-29")), 0);
        assert_eq!(days_remaining(at("2025-10-28"), at("2025-10-29")), -1);
    }

    #[test]
    fn test_days_remaining_rounds_up() {
        let now = at("2025-10-29T00:00:00Z");
        assert_eq!(days_remaining(at("2025-10-29T12:00:00Z"), now), 1);
        assert_eq!(days_remaining(at("2025-10-29T00:00:00.001Z"), now), 1);
        // half a day in the past rounds up to 0, as Math.ceil(-0.5) does
        assert_eq!(days_remaining(at("2025-10-28T12:00:00Z"), now), 0);
        assert_eq!(days_remaining(at("2025-10-27T12:00:00Z"), now), -1);
    }

    #[test]
    fn test_days_since_rounds_down() {
        let now = at("2025-10-29T10:30:00Z");
        assert_eq!(days_since(at("2025-10-28"), now), 1);
        assert_eq!(days_since(at("2025-10-29"), now), 0);
        assert_eq!(days_since(at("2025-10-31"), now), -2);
    }

    #[test]
    fn test_due_status() {
        assert_eq!(format_due_status(4), "Due in 4 days");
        assert_eq!(format_due_status(1), "Due tomorrow");
        assert_eq!(format_due_status(0), "Due today");
        assert_eq!(format_due_status(-1), "1 days overdue");
        assert_eq!(format_due_status(-12), "12 days overdue");
    }

    #[test]
    fn test_connected_status() {
        assert_eq!(format_connected_status(0), "Connected today");
        assert_eq!(format_connected_status(1), "1 day connected");
        assert_eq!(format_connected_status(30), "30 days connected");
        assert_eq!(format_connected_status(-2), "-2 days connected");
    }

    #[test]
    fn test_nudge_status() {
        assert_eq!(format_nudge_status(-3), "OVERDUE");
        assert_eq!(format_nudge_status(0), "NOTIFYING TODAY");
        assert_eq!(format_nudge_status(1), "NOTIFYING TOMORROW");
        assert_eq!(format_nudge_status(7), "NOTIFYING IN 7 DAYS");
    }

    #[test]
    fn test_due_soon_threshold_is_inclusive() {
        let now = at("2025-10-29");
        assert!(is_due_soon(at("2025-11-05"), now, 7));
        assert!(!is_due_soon(at("2025-11-06"), now, 7));
        assert!(is_due_soon(at("2025-10-29"), now, 7));
        assert!(!is_due_soon(at("2025-10-28"), now, 7));
        assert!(is_overdue(at("2025-10-28"), now));
        assert!(!is_overdue(at("2025-10-29"), now));
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(at("2025-10-29"), at("2025-10-29T00:00:00Z"));
        assert_eq!(at("2025-10-29T10:30:00+02:00"), at("2025-10-29T08:30:00Z"));
        assert_eq!(at("2025-10-29T10:30:00"), at("2025-10-29T10:30:00Z"));
        assert!(matches!(
            parse_instant("next tuesday"),
            Err(ConformError::DateParse(_))
        ));
    }

    #[test]
    fn test_formatter_threshold_override() {
        let fmt = StatusFormatter::at_str("2025-10-29")
            .unwrap()
            .with_due_soon_days(3);
        assert!(fmt.is_due_soon("2025-11-01").unwrap());
        assert!(!fmt.is_due_soon("2025-11-02").unwrap());
        assert_eq!(fmt.nudge_status("2025-10-31").unwrap(), "NOTIFYING IN 2 DAYS");
        assert!(fmt.due_status("soon").is_err());
    }
}
