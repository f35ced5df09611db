#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Attendance record, report type, and header feature types.
//!
//! Every stage of the attendance pipeline (extraction, variation rules, PDF
//! rendering) exchanges the value types defined here. The serialized field
//! names of [`AttendanceRecord`] are a contract: downstream consumers look
//! columns up by key, so `date`, `start`, `end`, `hours`, `break` and
//! `raw_line` must not be renamed.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Date format used for every normalized date string.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Layout variant of an attendance report.
///
/// Drives which optional columns are rendered and which direction the
/// variation rules shift times in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
pub enum ReportType {
    /// Long monthly listing, usually with a Sabbath/weekend marker column.
    A,
    /// Everything else.
    B,
}

/// How time tokens are laid out relative to the date lines of a document.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayoutMode {
    /// Each date's times sit near the date line, bounded by the next date.
    PerDateWindow,
    /// All start times appear in one run, then all end times, then
    /// optionally all break times.
    Block,
}

/// Strategy used to decide a document's [`ReportType`].
///
/// The two strategies disagree on what a Sabbath marker means, so exactly
/// one is selected per run and they are never combined.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportTypePolicy {
    /// Type A when there are at least ten dates and a long run of
    /// identical time tokens.
    #[default]
    RunLength,
    /// Type A when a Sabbath marker (or `SAT`) appears anywhere in the
    /// first-page text.
    SabbathMarker,
}

/// Resolution rule for two-digit years.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum YearPivot {
    /// `00..=79` map to the 2000s, `80..=99` to the 1900s.
    #[default]
    Pivot79,
    /// Every two-digit year maps to the 2000s.
    Always2000,
}

impl YearPivot {
    /// Expands a parsed year. Years with more than two digits pass through.
    #[must_use]
    pub const fn resolve(self, year: i32) -> i32 {
        if year >= 100 {
            return year;
        }
        match self {
            Self::Pivot79 => {
                if year <= 79 {
                    2000 + year
                } else {
                    1900 + year
                }
            }
            Self::Always2000 => 2000 + year,
        }
    }
}

/// A calendar date recognized on a specific line of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateToken {
    /// 0-based index of the line the date was found on.
    pub line_index: usize,
    /// The validated calendar date.
    pub date: NaiveDate,
}

impl DateToken {
    /// Returns the date as `YYYY-MM-DD`.
    #[must_use]
    pub fn iso(&self) -> String {
        self.date.format(ISO_DATE_FORMAT).to_string()
    }
}

/// One assembled row of an attendance table.
///
/// `start`, `end` and `break_time` hold `HH:MM` strings or are empty when
/// the slot could not be filled. `hours` is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// `YYYY-MM-DD`, possibly empty for records coming from other producers.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub hours: f64,
    /// Only populated in block layout, where break times form their own run.
    #[serde(
        rename = "break",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub break_time: Option<String>,
    /// Trimmed text of the line the date was found on.
    #[serde(default)]
    pub raw_line: String,
}

impl AttendanceRecord {
    /// Parses [`Self::date`] back into a calendar date.
    #[must_use]
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), ISO_DATE_FORMAT).ok()
    }
}

/// A record after the variation rules ran over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedRecord {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    /// Day of week of [`AttendanceRecord::date`], when it parses.
    #[serde(default)]
    pub weekday: Option<Weekday>,
    /// Whether the row falls on the Sabbath.
    #[serde(default)]
    pub is_sat: bool,
}

/// Optional columns detected in the header region of the first page.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeaderFeatureFlags {
    pub has_break: bool,
    pub has_notes: bool,
    pub has_shabbat: bool,
}
