//! Date and time token scanning for single lines of report text.
//!
//! Report text arrives from native PDF extraction or OCR and is noisy:
//! letters stand in for digits, punctuation shows up in full-width or
//! typographic variants, and times are written either delimited (`8:30`,
//! `08.30`) or compact (`0830`). Both scanners work on one line at a time
//! and never fail; anything that does not form a valid date or time is
//! dropped.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use attendance_report_models::YearPivot;
use chrono::NaiveDate;
use regex::{Captures, Regex};

/// Characters OCR engines commonly emit in place of digits.
pub const OCR_CONFUSIONS: &[(char, char)] = &[
    ('O', '0'),
    ('o', '0'),
    ('I', '1'),
    ('l', '1'),
    ('S', '5'),
    ('B', '8'),
];

/// Unicode dash, colon and period variants folded to their ASCII form.
pub const PUNCTUATION_FOLDS: &[(char, char)] = &[
    ('\u{2010}', '-'),
    ('\u{2011}', '-'),
    ('\u{2012}', '-'),
    ('\u{2013}', '-'),
    ('\u{2014}', '-'),
    ('\u{2015}', '-'),
    ('\u{2212}', '-'),
    ('\u{FE58}', '-'),
    ('\u{FE63}', '-'),
    ('\u{FF0D}', '-'),
    ('\u{FF1A}', ':'),
    ('\u{FE55}', ':'),
    ('\u{2236}', ':'),
    ('\u{A789}', ':'),
    ('\u{3002}', '.'),
    ('\u{FF0E}', '.'),
    ('\u{FE52}', '.'),
];

/// Zero of each decimal digit block folded to ASCII. Digits from other
/// scripts are not recognized.
pub const DIGIT_ZEROS: &[char] = &[
    '\u{0660}', // Arabic-Indic
    '\u{06F0}', // Extended Arabic-Indic
    '\u{0966}', // Devanagari
    '\u{09E6}', // Bengali
    '\u{FF10}', // Fullwidth
];

/// `YYYY-MM-DD` with `/`, `-` or `.` separators.
static YEAR_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{4})[/\-.]([0-9]{1,2})[/\-.]([0-9]{1,2})").expect("valid regex")
});

/// `D-M-YY` / `DD-MM-YYYY` with `/`, `-` or `.` separators.
static DAY_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{1,2})[/\-.]([0-9]{1,2})[/\-.]([0-9]{2,4})").expect("valid regex")
});

/// Delimited `H:MM` / `HH.MM`.
static DELIMITED_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{1,2})[:.]([0-9]{2})\b").expect("valid regex"));

/// Maximal digit runs, filtered to compact `HMM` / `HHMM` candidates.
static DIGIT_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// Order in which the date patterns are tried.
#[derive(Debug, Clone, Copy)]
enum DateOrder {
    YearFirst,
    DayFirst,
}

const DATE_PATTERNS: &[DateOrder] = &[DateOrder::YearFirst, DateOrder::DayFirst];

/// Finds the first valid calendar date on `line`.
///
/// Year-first dates are tried before day-first ones so that `2023-03-05`
/// is not misread as `23-03-05`. A pattern whose first match is not a
/// real calendar date falls through to the next pattern. Digits from the
/// blocks in [`DIGIT_ZEROS`] are read as their ASCII values.
#[must_use]
pub fn find_date(line: &str, pivot: YearPivot) -> Option<NaiveDate> {
    let line: String = line.chars().map(fold_digit).collect();
    DATE_PATTERNS
        .iter()
        .find_map(|order| match_date(&line, *order, pivot))
}

/// Maps a decimal digit from one of the [`DIGIT_ZEROS`] blocks to ASCII.
#[must_use]
pub fn fold_digit(c: char) -> char {
    DIGIT_ZEROS
        .iter()
        .find_map(|&zero| {
            let offset = u32::from(c).checked_sub(u32::from(zero))?;
            if offset < 10 {
                char::from_digit(offset, 10)
            } else {
                None
            }
        })
        .unwrap_or(c)
}

fn match_date(line: &str, order: DateOrder, pivot: YearPivot) -> Option<NaiveDate> {
    let re = match order {
        DateOrder::YearFirst => &*YEAR_FIRST_RE,
        DateOrder::DayFirst => &*DAY_FIRST_RE,
    };

    let caps = re
        .captures_iter(line)
        .find(|caps| caps.get(0).is_some_and(|m| !follows_digit(line, m.start())))?;

    let (year, month, day) = match order {
        DateOrder::YearFirst => (group(&caps, 1)?, group(&caps, 2)?, group(&caps, 3)?),
        DateOrder::DayFirst => (group(&caps, 3)?, group(&caps, 2)?, group(&caps, 1)?),
    };

    let year = pivot.resolve(i32::try_from(year).ok()?);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn group(caps: &Captures<'_>, idx: usize) -> Option<u32> {
    caps.get(idx)?.as_str().parse().ok()
}

fn follows_digit(line: &str, byte_idx: usize) -> bool {
    line[..byte_idx]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_digit())
}

/// Applies the OCR confusion table, folds punctuation variants and blanks
/// out every character that cannot be part of a date or time.
#[must_use]
pub fn clean_for_times(line: &str) -> String {
    line.chars()
        .map(|c| {
            let c = lookup(OCR_CONFUSIONS, c)
                .or_else(|| lookup(PUNCTUATION_FOLDS, c))
                .unwrap_or_else(|| fold_digit(c));
            if c.is_ascii_digit() || matches!(c, ':' | '.' | '/' | '-') || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn lookup(table: &[(char, char)], c: char) -> Option<char> {
    table.iter().find(|(from, _)| *from == c).map(|(_, to)| *to)
}

/// Extracts every valid `HH:MM` token on `line`.
///
/// The result is deduplicated and sorted, which for zero-padded `HH:MM`
/// strings is also chronological order.
#[must_use]
pub fn find_times(line: &str) -> Vec<String> {
    let clean = clean_for_times(line);
    let mut out = BTreeSet::new();

    for caps in DELIMITED_TIME_RE.captures_iter(&clean) {
        if let (Some(h), Some(m)) = (group(&caps, 1), group(&caps, 2))
            && let Some(time) = format_time(h, m)
        {
            out.insert(time);
        }
    }

    for run in DIGIT_RUN_RE.find_iter(&clean) {
        let token = run.as_str();
        if !(3..=4).contains(&token.len()) {
            continue;
        }
        if touches_date_separator(&clean, run.start(), run.end()) {
            continue;
        }
        let split = token.len() - 2;
        if let (Ok(h), Ok(m)) = (token[..split].parse(), token[split..].parse())
            && let Some(time) = format_time(h, m)
        {
            out.insert(time);
        }
    }

    out.into_iter().collect()
}

fn touches_date_separator(clean: &str, start: usize, end: usize) -> bool {
    let is_sep = |c: char| c == '/' || c == '-';
    clean[..start].chars().next_back().is_some_and(is_sep)
        || clean[end..].chars().next().is_some_and(is_sep)
}

/// Formats an hour/minute pair as `HH:MM` when both are in range.
#[must_use]
pub fn format_time(hour: u32, minute: u32) -> Option<String> {
    (hour <= 23 && minute <= 59).then(|| format!("{hour:02}:{minute:02}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(line: &str) -> Option<String> {
        find_date(line, YearPivot::Pivot79).map(|d| d.format("%Y-%m-%d").to_string())
    }

    #[test]
    fn every_valid_time_round_trips() {
        for h in 0..=23 {
            for m in 0..=59 {
                let token = format!("{h:02}:{m:02}");
                assert_eq!(find_times(&token), vec![token.clone()]);
            }
        }
    }

    #[test]
    fn out_of_range_times_are_dropped() {
        assert!(find_times("24:00").is_empty());
        assert!(find_times("12:60").is_empty());
        assert!(find_times("2500").is_empty());
        assert!(find_times("975").is_empty());
    }

    #[test]
    fn compact_tokens_are_split() {
        assert_eq!(find_times("0830 1715"), vec!["08:30", "17:15"]);
        assert_eq!(find_times("830"), vec!["08:30"]);
    }

    #[test]
    fn compact_tokens_next_to_date_separators_are_ignored() {
        assert!(find_times("5/3/2023").is_empty());
        assert!(find_times("12345").is_empty());
    }

    #[test]
    fn ocr_confusions_are_corrected() {
        assert_eq!(find_times("O8:3O"), vec!["08:30"]);
        assert_eq!(find_times("l7:I5"), vec!["17:15"]);
        assert_eq!(find_times("1B:S0"), vec!["18:50"]);
    }

    #[test]
    fn unicode_colons_are_folded() {
        assert_eq!(find_times("08\u{FF1A}00 - 16\u{FF1A}30"), vec!["08:00", "16:30"]);
    }

    #[test]
    fn times_are_deduplicated_and_sorted() {
        assert_eq!(
            find_times("17:00 08:00 17:00 0800"),
            vec!["08:00", "17:00"]
        );
    }

    #[test]
    fn hebrew_text_around_times_is_ignored() {
        assert_eq!(find_times("כניסה 08:15 יציאה 16:45"), vec!["08:15", "16:45"]);
    }

    #[test]
    fn date_separators_are_interchangeable() {
        assert_eq!(date("5/3/2023").as_deref(), Some("2023-03-05"));
        assert_eq!(date("5-3-2023").as_deref(), Some("2023-03-05"));
        assert_eq!(date("5.3.2023").as_deref(), Some("2023-03-05"));
    }

    #[test]
    fn two_digit_years_follow_the_pivot() {
        assert_eq!(date("1/1/79").as_deref(), Some("2079-01-01"));
        assert_eq!(date("1/1/80").as_deref(), Some("1980-01-01"));
        assert_eq!(
            find_date("1/1/80", YearPivot::Always2000).map(|d| d.to_string()),
            Some("2080-01-01".to_owned())
        );
    }

    #[test]
    fn year_first_dates_win() {
        assert_eq!(date("יום א 2023-03-05").as_deref(), Some("2023-03-05"));
        assert_eq!(date("2023/12/31").as_deref(), Some("2023-12-31"));
    }

    #[test]
    fn invalid_calendar_dates_are_rejected() {
        assert_eq!(date("31/2/2023"), None);
        assert_eq!(date("1/13/2023"), None);
        assert_eq!(date("no date here 08:00"), None);
    }

    #[test]
    fn first_date_on_a_line_is_taken() {
        assert_eq!(date("1/3/2023 2/3/2023").as_deref(), Some("2023-03-01"));
    }

    #[test]
    fn non_ascii_decimal_digits_are_read() {
        assert_eq!(date("٥/٣/٢٠٢٣").as_deref(), Some("2023-03-05"));
        assert_eq!(date("۲۰۲۳-۰۳-۰۵").as_deref(), Some("2023-03-05"));
        assert_eq!(find_times("٠٨:٣٠ ０９：１５"), vec!["08:30", "09:15"]);
    }

    #[test]
    fn fold_digit_leaves_other_chars_alone() {
        assert_eq!(fold_digit('٧'), '7');
        assert_eq!(fold_digit('7'), '7');
        assert_eq!(fold_digit('ש'), 'ש');
        assert_eq!(fold_digit('\u{066A}'), '\u{066A}');
    }
}
