//! Optional column detection from first-page header text.

use attendance_report_models::HeaderFeatureFlags;

const SHABBAT_MARKERS: &[&str] = &["שבת", "sat"];
const BREAK_MARKERS: &[&str] = &["הפסק", "break"];
const NOTES_MARKERS: &[&str] = &["הערות", "הערה", "notes"];

/// Detects which optional columns the report header mentions.
///
/// Matching is a case-insensitive substring search over the text with
/// newlines flattened, and again with all whitespace removed so markers
/// split by OCR spacing are still found.
#[must_use]
pub fn detect_features(header_text: &str) -> HeaderFeatureFlags {
    let flat = header_text.replace(['\r', '\n'], " ").to_lowercase();
    let compact: String = flat.chars().filter(|c| !c.is_whitespace()).collect();
    let mentions = |markers: &[&str]| {
        markers
            .iter()
            .any(|m| flat.contains(m) || compact.contains(m))
    };

    let flags = HeaderFeatureFlags {
        has_break: mentions(BREAK_MARKERS),
        has_notes: mentions(NOTES_MARKERS),
        has_shabbat: mentions(SHABBAT_MARKERS),
    };
    log::debug!("Header features: {flags:?}");
    flags
}
