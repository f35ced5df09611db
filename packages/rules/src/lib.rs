#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Deterministic per-report-type variation rules for attendance records.
//!
//! Every record is shifted by a few minutes picked from a SHA-256 hash of
//! the report type, the date and a salt, so the same input always yields
//! the same output on every platform. Type A reports shift later, type B
//! reports shift earlier, and daily hours are clamped to a realistic range.

use attendance_report_extract::hours::{minutes_of_day, round2};
use attendance_report_extract::layout::has_sabbath_marker;
use attendance_report_models::{AdjustedRecord, AttendanceRecord, ReportType};
use chrono::{Datelike as _, Weekday};
use sha2::{Digest as _, Sha256};

/// Minute offsets a hash bucket maps to.
pub const DELTA_BUCKETS: [i64; 5] = [-10, -5, 0, 5, 10];

/// Hours assigned to rows without usable times and without hours.
pub const FALLBACK_HOURS: [f64; 3] = [6.0, 7.5, 8.0];

/// Shortest shift the rules produce, in minutes.
pub const MIN_SHIFT_MINUTES: i64 = 4 * 60;

/// Longest shift the rules produce, in minutes.
pub const MAX_SHIFT_MINUTES: i64 = 12 * 60;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Salts separating the independent hash draws made for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Salt {
    Start = 1,
    End = 2,
    Repair = 3,
    Fallback = 4,
}

/// Adjusted rows plus one human-readable log line per row.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub records: Vec<AdjustedRecord>,
    pub log: Vec<String>,
}

/// Hex SHA-256 digest of `"{type}|{date}|{salt}"`.
#[must_use]
pub fn variation_digest(report_type: ReportType, date: &str, salt: Salt) -> String {
    let key = format!("{report_type}|{date}|{}", salt as u8);
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Minute delta for a `(type, date, salt)` triple, one of [`DELTA_BUCKETS`].
///
/// The first hash byte (the first two hex digits) modulo 5 picks the
/// bucket.
#[must_use]
pub fn deterministic_minutes(report_type: ReportType, date: &str, salt: Salt) -> i64 {
    let digest = variation_digest(report_type, date, salt);
    let first = u8::from_str_radix(&digest[..2], 16).unwrap_or_default();
    DELTA_BUCKETS[usize::from(first % 5)]
}

/// Applies the variation rules to every record.
///
/// Records are never modified in place; a fresh sequence is returned.
#[must_use]
pub fn apply_rules(records: &[AttendanceRecord], report_type: ReportType) -> RuleOutcome {
    let mut adjusted = Vec::with_capacity(records.len());
    let mut log = Vec::with_capacity(records.len());

    for (idx, record) in records.iter().enumerate() {
        let date = record.date.trim();
        let times = minutes_of_day(&record.start).zip(minutes_of_day(&record.end));

        let mut out = record.clone();
        out.date = date.to_owned();

        if let Some((start, end)) = times {
            let (start, end, hours) = vary_shift(report_type, date, start, end);
            out.start = format_minutes(start);
            out.end = format_minutes(end);
            out.hours = hours;
            log.push(format!(
                "Row {idx} ({date}): {}-{} -> {}-{} ({hours:?}h)",
                record.start.trim(),
                record.end.trim(),
                out.start,
                out.end,
            ));
        } else {
            out.hours = fallback_hours(report_type, date, record.hours);
            log.push(format!(
                "Row {idx} ({date}): kept times, hours={:?}",
                out.hours
            ));
        }

        let weekday = out.parsed_date().map(|d| d.weekday());
        let is_sat = weekday == Some(Weekday::Sat) || has_sabbath_marker(&out.raw_line);
        adjusted.push(AdjustedRecord {
            record: out,
            weekday,
            is_sat,
        });
    }

    for line in &log {
        log::debug!("{line}");
    }

    RuleOutcome {
        records: adjusted,
        log,
    }
}

/// Shifts a start/end pair and clamps the resulting shift length.
///
/// Times are signed minutes relative to the start day's midnight, so a
/// shift pushed past midnight keeps its day carry until it is formatted.
fn vary_shift(report_type: ReportType, date: &str, start: i64, end: i64) -> (i64, i64, f64) {
    let mut start_delta = deterministic_minutes(report_type, date, Salt::Start);
    let mut end_delta = deterministic_minutes(report_type, date, Salt::End);

    match report_type {
        ReportType::A => {
            start_delta = start_delta.max(0);
            end_delta = end_delta.max(0);
        }
        ReportType::B => {
            start_delta = start_delta.min(0);
            end_delta = end_delta.min(0);
        }
    }

    let start = start + start_delta;
    let mut end = end + end_delta;

    if end <= start {
        let repair = deterministic_minutes(report_type, date, Salt::Repair).abs();
        end = start + 30 + repair * 9;
    }

    let mut length = end - start;
    if length <= 0 {
        length += MINUTES_PER_DAY;
    }

    if length < MIN_SHIFT_MINUTES {
        end += MIN_SHIFT_MINUTES - length;
        length = MIN_SHIFT_MINUTES;
    } else if length > MAX_SHIFT_MINUTES {
        end -= length - MAX_SHIFT_MINUTES;
        length = MAX_SHIFT_MINUTES;
    }

    #[allow(clippy::cast_precision_loss)]
    let hours = round2(length as f64 / 60.0);
    (start, end, hours)
}

fn fallback_hours(report_type: ReportType, date: &str, hours: f64) -> f64 {
    if hours > 0.0 {
        return round2(hours);
    }
    let bucket = deterministic_minutes(report_type, date, Salt::Fallback).unsigned_abs() / 5;
    usize::try_from(bucket)
        .ok()
        .and_then(|b| FALLBACK_HOURS.get(b))
        .copied()
        .unwrap_or(FALLBACK_HOURS[0])
}

fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
