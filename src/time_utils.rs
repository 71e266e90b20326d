// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and calendar arithmetic.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time as an RFC3339 string (the storage format for timestamps).
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Extract the calendar date from a stored RFC3339 timestamp.
///
/// Returns `None` for anything unparseable rather than guessing.
pub fn date_of(timestamp: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

/// How a new activity date relates to the previous one, for streak tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStep {
    /// Same calendar day as the previous activity.
    SameDay,
    /// Exactly the next calendar day.
    NextDay,
    /// A gap (or out-of-order date); the streak is broken.
    Gap,
}

/// Classify `today` against the last recorded activity date.
pub fn day_step(last: NaiveDate, today: NaiveDate) -> DayStep {
    match (today - last).num_days() {
        0 => DayStep::SameDay,
        1 => DayStep::NextDay,
        _ => DayStep::Gap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_day_step_classification() {
        assert_eq!(day_step(d("2024-03-01"), d("2024-03-01")), DayStep::SameDay);
        assert_eq!(day_step(d("2024-03-01"), d("2024-03-02")), DayStep::NextDay);
        assert_eq!(day_step(d("2024-03-01"), d("2024-03-04")), DayStep::Gap);
        // Month boundary
        assert_eq!(day_step(d("2024-02-29"), d("2024-03-01")), DayStep::NextDay);
        // Clock skew producing an earlier date breaks the streak
        assert_eq!(day_step(d("2024-03-02"), d("2024-03-01")), DayStep::Gap);
    }

    #[test]
    fn test_date_of_parses_storage_format() {
        assert_eq!(date_of("2024-01-15T10:30:00Z"), Some(d("2024-01-15")));
        assert_eq!(date_of("not-a-date"), None);
    }
}
