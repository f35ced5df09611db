//! Whole-document layout and report-type heuristics.
//!
//! Both classifiers look at the same two aggregates: how many lines carry
//! a date, and the longest run of identical time tokens across the whole
//! document. A long run means times were printed column by column (all
//! starts, then all ends) instead of row by row.

use attendance_report_models::{DateToken, LayoutMode, ReportType, ReportTypePolicy, YearPivot};

use crate::scanner::{find_date, find_times};

/// Minimum number of date lines before a document can be type A under
/// [`ReportTypePolicy::RunLength`].
pub const TYPE_A_MIN_DATES: usize = 10;

/// Sabbath marker and the OCR misreadings of it seen in scanned reports.
pub const SABBATH_MARKERS: &[&str] = &["שבת", "שכת", "שבח", "סבת"];

/// ASCII marker matched case-insensitively alongside [`SABBATH_MARKERS`].
pub const SATURDAY_MARKER: &str = "SAT";

/// Aggregate token counts over a whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentScan {
    /// Date tokens in document order.
    pub dates: Vec<DateToken>,
    /// Every time token in document order (per line sorted, lines in order).
    pub times: Vec<String>,
}

impl DocumentScan {
    /// Scans every line of `lines` for dates and times.
    #[must_use]
    pub fn new(lines: &[&str], pivot: YearPivot) -> Self {
        let dates = collect_dates(lines, pivot);
        let times = lines.iter().flat_map(|line| find_times(line)).collect();
        Self { dates, times }
    }

    /// Length of the longest run of identical time tokens.
    #[must_use]
    pub fn longest_time_run(&self) -> usize {
        longest_run(&self.times)
    }
}

/// Records `(line index, date)` for every line carrying a date.
#[must_use]
pub fn collect_dates(lines: &[&str], pivot: YearPivot) -> Vec<DateToken> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(line_index, line)| {
            find_date(line, pivot).map(|date| DateToken { line_index, date })
        })
        .collect()
}

/// Length of the longest maximal run of consecutive identical tokens.
#[must_use]
pub fn longest_run<T: PartialEq>(tokens: &[T]) -> usize {
    let mut best = 0;
    let mut current = 0;
    let mut prev: Option<&T> = None;

    for token in tokens {
        if prev == Some(token) {
            current += 1;
        } else {
            current = 1;
            prev = Some(token);
        }
        best = best.max(current);
    }

    best
}

/// Decides between block and per-date window layout.
#[must_use]
pub fn classify_layout(lines: &[&str], pivot: YearPivot) -> LayoutMode {
    layout_for(&DocumentScan::new(lines, pivot))
}

/// Layout decision over an existing scan.
///
/// Block mode when the longest identical run reaches `max(3, N / 3)`.
#[must_use]
pub fn layout_for(scan: &DocumentScan) -> LayoutMode {
    let threshold = (scan.dates.len() / 3).max(3);
    if scan.longest_time_run() >= threshold {
        LayoutMode::Block
    } else {
        LayoutMode::PerDateWindow
    }
}

/// Classifies the report type of `text` with the selected policy.
#[must_use]
pub fn classify_report_type(
    text: &str,
    policy: ReportTypePolicy,
    pivot: YearPivot,
) -> ReportType {
    let report_type = match policy {
        ReportTypePolicy::RunLength => {
            let lines: Vec<&str> = text.lines().collect();
            run_length_type(&DocumentScan::new(&lines, pivot))
        }
        ReportTypePolicy::SabbathMarker => sabbath_marker_type(text),
    };
    log::debug!("Report type {report_type} via {policy} policy");
    report_type
}

/// Type A when there are at least [`TYPE_A_MIN_DATES`] dates and the
/// longest identical run reaches `max(3, N / 4)`.
#[must_use]
pub fn run_length_type(scan: &DocumentScan) -> ReportType {
    let n = scan.dates.len();
    if n >= TYPE_A_MIN_DATES && scan.longest_time_run() >= (n / 4).max(3) {
        ReportType::A
    } else {
        ReportType::B
    }
}

/// Type A when any Sabbath marker appears in `text`.
#[must_use]
pub fn sabbath_marker_type(text: &str) -> ReportType {
    if has_sabbath_marker(text) {
        ReportType::A
    } else {
        ReportType::B
    }
}

/// Whether `text` carries a Sabbath marker or the ASCII `SAT`.
#[must_use]
pub fn has_sabbath_marker(text: &str) -> bool {
    SABBATH_MARKERS.iter().any(|m| text.contains(m))
        || text.to_uppercase().contains(SATURDAY_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_length(lines: &[String]) -> ReportType {
        classify_report_type(
            &lines.join("\n"),
            ReportTypePolicy::RunLength,
            YearPivot::Pivot79,
        )
    }

    fn dated_lines(n: usize) -> Vec<String> {
        (1..=n).map(|d| format!("{d}/3/2023")).collect()
    }

    #[test]
    fn longest_run_counts_identical_neighbours() {
        assert_eq!(longest_run::<&str>(&[]), 0);
        assert_eq!(longest_run(&["a"]), 1);
        assert_eq!(longest_run(&["a", "a", "b", "b", "b", "a"]), 3);
    }

    #[test]
    fn repeated_blocks_are_block_mode() {
        let mut lines = dated_lines(12);
        lines.extend(std::iter::repeat_n("08:00".to_owned(), 12));
        lines.extend(std::iter::repeat_n("17:00".to_owned(), 12));
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();

        assert_eq!(classify_layout(&refs, YearPivot::Pivot79), LayoutMode::Block);
    }

    #[test]
    fn interleaved_rows_are_window_mode() {
        let lines: Vec<String> = (1..=12)
            .map(|d| format!("{d}/3/2023 08:{:02} 17:{:02}", d, d + 10))
            .collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();

        assert_eq!(
            classify_layout(&refs, YearPivot::Pivot79),
            LayoutMode::PerDateWindow
        );
    }

    #[test]
    fn short_documents_need_a_run_of_three() {
        let refs = ["1/3/2023", "08:00", "08:00", "17:00"];
        assert_eq!(
            classify_layout(&refs, YearPivot::Pivot79),
            LayoutMode::PerDateWindow
        );
        let refs = ["1/3/2023", "08:00", "08:00", "08:00"];
        assert_eq!(classify_layout(&refs, YearPivot::Pivot79), LayoutMode::Block);
    }

    #[test]
    fn run_length_policy_needs_ten_dates() {
        let mut lines = dated_lines(9);
        lines.extend(std::iter::repeat_n("08:00".to_owned(), 9));
        assert_eq!(run_length(&lines), ReportType::B);

        let mut lines = dated_lines(12);
        lines.extend(std::iter::repeat_n("08:00".to_owned(), 3));
        assert_eq!(run_length(&lines), ReportType::A);
    }

    #[test]
    fn run_length_policy_rejects_short_runs() {
        let mut lines = dated_lines(20);
        lines.extend(["08:00", "08:00", "08:00", "08:00", "17:00"].map(str::to_owned));
        assert_eq!(run_length(&lines), ReportType::B);
    }

    #[test]
    fn sabbath_marker_policy_looks_for_markers() {
        let policy = ReportTypePolicy::SabbathMarker;
        assert_eq!(
            classify_report_type("תאריך שבת כניסה", policy, YearPivot::Pivot79),
            ReportType::A
        );
        assert_eq!(
            classify_report_type("Date Sat In Out", policy, YearPivot::Pivot79),
            ReportType::A
        );
        assert_eq!(
            classify_report_type("Date In Out", policy, YearPivot::Pivot79),
            ReportType::B
        );
    }
}
