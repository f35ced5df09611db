#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Attendance record extraction from raw report text.
//!
//! Turns the multi-line text of an attendance report (native PDF text or
//! OCR output, possibly mixing scripts and reading directions) into a table
//! of [`AttendanceRecord`]s. Everything here is deterministic, line
//! oriented and regex based:
//!
//! 1. [`scanner`] pulls date and time tokens out of single lines
//! 2. [`layout`] decides whether times are laid out per row or in blocks,
//!    and which [`ReportType`](attendance_report_models::ReportType) the
//!    document is
//! 3. [`assemble`] pairs dates with times and computes hours via [`hours`]
//! 4. [`features`] detects optional header columns
//!
//! Nothing in this crate returns an error: unreadable lines, out-of-range
//! times and malformed durations degrade to empty values.

pub mod assemble;
pub mod features;
pub mod hours;
pub mod layout;
pub mod scanner;

use attendance_report_models::{AttendanceRecord, LayoutMode, YearPivot};

use crate::layout::{DocumentScan, layout_for};

/// Records extracted from one document, with the layout used.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub layout: LayoutMode,
    pub records: Vec<AttendanceRecord>,
}

impl Extraction {
    /// Whether no date was found in the document.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Extracts attendance records from the full text of a document.
///
/// A document without any date yields an empty record set.
#[must_use]
pub fn extract_records(text: &str, pivot: YearPivot) -> Extraction {
    let lines: Vec<&str> = text.lines().collect();
    let scan = DocumentScan::new(&lines, pivot);

    if scan.dates.is_empty() {
        log::debug!("No dates found in {} lines", lines.len());
        return Extraction {
            layout: LayoutMode::PerDateWindow,
            records: Vec::new(),
        };
    }

    let layout = layout_for(&scan);
    log::debug!(
        "Found {} dates and {} time tokens over {} lines (longest run {}), using {layout} layout",
        scan.dates.len(),
        scan.times.len(),
        lines.len(),
        scan.longest_time_run(),
    );

    let records = assemble::assemble(&lines, &scan.dates, layout);

    Extraction { layout, records }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_window_layout_document() {
        let text = "דוח נוכחות\n1/3/2023 ראשון\n08:00 16:30\n\n\n\n\n\n\n2/3/2023 שני\n09:00 17:15\n";
        let extraction = extract_records(text, YearPivot::Pivot79);

        assert_eq!(extraction.layout, LayoutMode::PerDateWindow);
        assert_eq!(extraction.records.len(), 2);
        assert!((extraction.records[0].hours - 8.5).abs() < f64::EPSILON);
        assert_eq!(extraction.records[1].start, "09:00");
        assert_eq!(extraction.records[1].end, "17:15");
        assert!((extraction.records[1].hours - 8.25).abs() < f64::EPSILON);
    }

    #[test]
    fn extracts_block_layout_document() {
        let mut lines: Vec<String> = (1..=12).map(|d| format!("{d:02}/03/2023")).collect();
        lines.extend(std::iter::repeat_n("08:00".to_owned(), 12));
        lines.extend(std::iter::repeat_n("17:00".to_owned(), 12));
        lines.extend(std::iter::repeat_n("00:45".to_owned(), 12));

        let extraction = extract_records(&lines.join("\n"), YearPivot::Pivot79);

        assert_eq!(extraction.layout, LayoutMode::Block);
        assert_eq!(extraction.records.len(), 12);
        assert!(extraction.records.iter().all(|r| {
            r.start == "08:00" && r.end == "17:00" && r.break_time.as_deref() == Some("00:45")
        }));
    }

    #[test]
    fn text_without_dates_is_empty() {
        let extraction = extract_records("08:00 17:00\nno dates", YearPivot::Pivot79);
        assert!(extraction.is_empty());
    }

    #[test]
    fn empty_text_is_empty() {
        assert!(extract_records("", YearPivot::Always2000).is_empty());
    }
}
