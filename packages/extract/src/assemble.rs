//! Maps date tokens to start/end/break times.
//!
//! Two layouts are supported:
//! - **Block**: the document lists every start time, then every end time,
//!   then optionally every break time. Slots are paired with dates by
//!   position.
//! - **Per-date window**: each date owns the lines from a few lines above
//!   it up to the next date line. The first two times in that window are
//!   its start and end.

use attendance_report_models::{AttendanceRecord, DateToken, LayoutMode};

use crate::hours::duration;
use crate::scanner::find_times;

/// How many lines above a date line still belong to its window.
pub const WINDOW_LOOKBACK: usize = 5;

/// Builds one record per date token.
///
/// `dates` must come from the same `lines` and be in document order.
#[must_use]
pub fn assemble(lines: &[&str], dates: &[DateToken], mode: LayoutMode) -> Vec<AttendanceRecord> {
    match mode {
        LayoutMode::Block => assemble_blocks(lines, dates),
        LayoutMode::PerDateWindow => assemble_windows(lines, dates),
    }
}

fn assemble_blocks(lines: &[&str], dates: &[DateToken]) -> Vec<AttendanceRecord> {
    let times: Vec<String> = lines.iter().flat_map(|line| find_times(line)).collect();
    let n = dates.len();
    let slot = |idx: usize| times.get(idx).cloned().unwrap_or_default();

    dates
        .iter()
        .enumerate()
        .map(|(idx, token)| {
            let start = slot(idx);
            let end = slot(n + idx);
            let break_time = slot(2 * n + idx);
            build_record(lines, token, start, end, Some(break_time))
        })
        .collect()
}

fn assemble_windows(lines: &[&str], dates: &[DateToken]) -> Vec<AttendanceRecord> {
    dates
        .iter()
        .enumerate()
        .map(|(idx, token)| {
            let window_end = dates
                .get(idx + 1)
                .map_or(lines.len(), |next| next.line_index);
            let window_start = token.line_index.saturating_sub(WINDOW_LOOKBACK);

            let mut times = lines
                .get(window_start..window_end)
                .unwrap_or_default()
                .iter()
                .flat_map(|line| find_times(line));

            let start = times.next().unwrap_or_default();
            let end = times.next().unwrap_or_default();
            build_record(lines, token, start, end, None)
        })
        .collect()
}

fn build_record(
    lines: &[&str],
    token: &DateToken,
    start: String,
    end: String,
    break_time: Option<String>,
) -> AttendanceRecord {
    let hours = duration(&start, &end);
    let raw_line = lines
        .get(token.line_index)
        .map(|line| line.trim().to_owned())
        .unwrap_or_default();

    AttendanceRecord {
        date: token.iso(),
        start,
        end,
        hours,
        break_time,
        raw_line,
    }
}

#[cfg(test)]
mod tests {
    use attendance_report_models::YearPivot;

    use super::*;
    use crate::layout::collect_dates;

    fn run(lines: &[&str], mode: LayoutMode) -> Vec<AttendanceRecord> {
        let dates = collect_dates(lines, YearPivot::Pivot79);
        assemble(lines, &dates, mode)
    }

    #[test]
    fn window_takes_first_two_times() {
        let records = run(&["1/3/2023", "09:00", "17:15"], LayoutMode::PerDateWindow);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, "2023-03-01");
        assert_eq!(records[0].start, "09:00");
        assert_eq!(records[0].end, "17:15");
        assert!((records[0].hours - 8.25).abs() < f64::EPSILON);
        assert_eq!(records[0].break_time, None);
    }

    #[test]
    fn window_stops_at_next_date() {
        let lines = [
            "1/3/2023 ראשון",
            "08:00 16:00",
            "2/3/2023 שני",
            "07:30",
        ];
        let records = run(&lines, LayoutMode::PerDateWindow);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].start, "08:00");
        assert_eq!(records[0].end, "16:00");
        assert!((records[0].hours - 8.0).abs() < f64::EPSILON);
        assert_eq!(records[0].raw_line, "1/3/2023 ראשון");
        // The second window reaches back over the first date's times.
        assert_eq!(records[1].start, "08:00");
        assert_eq!(records[1].end, "16:00");
    }

    #[test]
    fn window_extra_times_are_dropped() {
        let records = run(&["1/3/2023 08:00 12:00 12:30 17:00"], LayoutMode::PerDateWindow);
        assert_eq!(records[0].start, "08:00");
        assert_eq!(records[0].end, "12:00");
    }

    #[test]
    fn window_without_times_has_zero_hours() {
        let records = run(&["  1/3/2023  "], LayoutMode::PerDateWindow);
        assert_eq!(records[0].start, "");
        assert_eq!(records[0].end, "");
        assert!(records[0].hours.abs() < f64::EPSILON);
        assert_eq!(records[0].raw_line, "1/3/2023");
    }

    #[test]
    fn block_pairs_slots_by_position() {
        let mut lines: Vec<String> = (1..=4).map(|d| format!("{d}/3/2023")).collect();
        lines.extend(std::iter::repeat_n("08:00".to_owned(), 4));
        lines.extend(std::iter::repeat_n("17:00".to_owned(), 4));
        lines.extend(std::iter::repeat_n("00:30".to_owned(), 4));
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();

        let records = run(&refs, LayoutMode::Block);

        assert_eq!(records.len(), 4);
        for record in &records {
            assert_eq!(record.start, "08:00");
            assert_eq!(record.end, "17:00");
            assert_eq!(record.break_time.as_deref(), Some("00:30"));
            assert!((record.hours - 9.0).abs() < f64::EPSILON);
        }
        assert_eq!(records[3].date, "2023-03-04");
    }

    #[test]
    fn block_missing_slots_are_empty() {
        let lines = ["1/3/2023", "2/3/2023", "08:00", "08:00", "17:00"];
        let records = run(&lines, LayoutMode::Block);

        assert_eq!(records[0].end, "17:00");
        assert_eq!(records[1].start, "08:00");
        assert_eq!(records[1].end, "");
        assert!(records[1].hours.abs() < f64::EPSILON);
        assert_eq!(records[1].break_time.as_deref(), Some(""));
    }

    #[test]
    fn no_dates_yield_no_records() {
        assert!(run(&["08:00", "17:00"], LayoutMode::PerDateWindow).is_empty());
        assert!(run(&[], LayoutMode::Block).is_empty());
    }
}
