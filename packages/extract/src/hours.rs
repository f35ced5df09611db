//! Time arithmetic shared by record assembly and the variation rules.

use chrono::{NaiveTime, Timelike as _};

/// Format of every time token.
pub const TIME_FORMAT: &str = "%H:%M";

/// Parses an `HH:MM` token.
#[must_use]
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveTime::parse_from_str(value, TIME_FORMAT).ok()
}

/// Minutes since midnight of an `HH:MM` token.
#[must_use]
pub fn minutes_of_day(value: &str) -> Option<i64> {
    parse_time(value).map(|t| i64::from(t.hour() * 60 + t.minute()))
}

/// Hours between `start` and `end`, rounded to two decimals.
///
/// An `end` earlier than `start` is taken to cross midnight once. Missing
/// or malformed tokens yield `0.0`.
#[must_use]
pub fn duration(start: &str, end: &str) -> f64 {
    let (Some(start), Some(end)) = (minutes_of_day(start), minutes_of_day(end)) else {
        return 0.0;
    };

    #[allow(clippy::cast_precision_loss)]
    let mut delta = (end - start) as f64 / 60.0;
    if delta < 0.0 {
        delta += 24.0;
    }
    round2(delta)
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_day_shift() {
        assert!((duration("08:00", "16:30") - 8.5).abs() < f64::EPSILON);
    }

    #[test]
    fn wraps_overnight_shift() {
        assert!((duration("22:00", "06:00") - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert!((duration("09:00", "09:20") - 0.33).abs() < f64::EPSILON);
    }

    #[test]
    fn identical_times_are_zero() {
        assert!(duration("08:00", "08:00").abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_tokens_yield_zero() {
        assert!(duration("", "16:30").abs() < f64::EPSILON);
        assert!(duration("08:00", "").abs() < f64::EPSILON);
        assert!(duration("8h", "16:30").abs() < f64::EPSILON);
        assert!(duration("25:00", "16:30").abs() < f64::EPSILON);
    }

    #[test]
    fn parses_minutes_of_day() {
        assert_eq!(minutes_of_day("17:15"), Some(1035));
        assert_eq!(minutes_of_day("nope"), None);
    }
}
