//! Paginated attendance table rendering.
//!
//! Produces a plain A4 table: a title line, a grey header row repeated on
//! every page, one bordered row per record and a totals footer. Text is
//! set in the standard Helvetica font, so anything outside printable ASCII
//! is replaced; shaping right-to-left scripts is left to other tools.

use std::path::{Path, PathBuf};

use attendance_report_models::{AdjustedRecord, HeaderFeatureFlags, ReportType};
use chrono::Weekday;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use crate::PdfError;

/// Points per millimetre.
const MM: f32 = 72.0 / 25.4;
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 15.0 * MM;
const ROW_HEIGHT: f32 = 8.0 * MM;
const FONT_SIZE: f32 = 10.0;
const FONT_NAME: &str = "F1";
/// Average Helvetica glyph advance, as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.556;
const TEXT_PAD: f32 = 2.0;
const USABLE_BOTTOM: f32 = MARGIN + 24.0;
const TABLE_TOP: f32 = PAGE_HEIGHT - MARGIN - 12.0 * MM;

/// Break shown for rows of six hours or more when the record has none.
pub const DEFAULT_BREAK: &str = "00:30";

/// Shifts at least this long get [`DEFAULT_BREAK`].
pub const DEFAULT_BREAK_MIN_HOURS: f64 = 6.0;

/// Which record field a column shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey {
    Date,
    Weekday,
    Start,
    End,
    Break,
    Hours,
    Notes,
    IsSat,
}

/// Horizontal text alignment within a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// One rendered column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub key: ColumnKey,
    pub title: &'static str,
    /// Width in millimetres.
    pub width_mm: f32,
    pub align: Align,
}

const fn column(key: ColumnKey, title: &'static str, width_mm: f32, align: Align) -> Column {
    Column {
        key,
        title,
        width_mm,
        align,
    }
}

/// Columns to render for a report.
///
/// Break and notes follow the header flags. The Sabbath column is only
/// shown on type A reports whose header has one.
#[must_use]
pub fn columns_for(report_type: ReportType, flags: HeaderFeatureFlags) -> Vec<Column> {
    let mut cols = vec![
        column(ColumnKey::Date, "Date", 28.0, Align::Left),
        column(ColumnKey::Weekday, "Weekday", 22.0, Align::Left),
        column(ColumnKey::Start, "Start", 24.0, Align::Left),
        column(ColumnKey::End, "End", 24.0, Align::Left),
    ];
    if flags.has_break {
        cols.push(column(ColumnKey::Break, "Break", 20.0, Align::Left));
    }
    cols.push(column(ColumnKey::Hours, "Total hours", 24.0, Align::Right));
    if flags.has_notes {
        cols.push(column(ColumnKey::Notes, "Notes", 25.0, Align::Left));
    }
    if flags.has_shabbat && report_type == ReportType::A {
        cols.push(column(ColumnKey::IsSat, "Sabbath", 14.0, Align::Left));
    }
    cols
}

/// Formats one cell.
#[must_use]
pub fn cell_text(record: &AdjustedRecord, key: ColumnKey) -> String {
    let row = &record.record;
    match key {
        ColumnKey::Date => row.date.clone(),
        ColumnKey::Weekday => record.weekday.map(weekday_name).unwrap_or_default().to_owned(),
        ColumnKey::Start => row.start.clone(),
        ColumnKey::End => row.end.clone(),
        ColumnKey::Break => match row.break_time.as_deref() {
            Some(b) if !b.is_empty() => b.to_owned(),
            _ if row.hours >= DEFAULT_BREAK_MIN_HOURS => DEFAULT_BREAK.to_owned(),
            _ => String::new(),
        },
        ColumnKey::Hours => format!("{:.2}", row.hours),
        ColumnKey::Notes => String::new(),
        ColumnKey::IsSat if record.is_sat => "yes".to_owned(),
        ColumnKey::IsSat => String::new(),
    }
}

const fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Sum of hours and number of rows with positive hours.
#[must_use]
pub fn totals(records: &[AdjustedRecord]) -> (f64, usize) {
    let total = records.iter().map(|r| r.record.hours).sum();
    let work_days = records.iter().filter(|r| r.record.hours > 0.0).count();
    (total, work_days)
}

/// Renders the report and writes it to `path`.
///
/// Nothing is written for an empty record set; `Ok(false)` is returned
/// instead. The file is written to a temporary sibling first and renamed
/// into place, so a failed write never leaves a partial report behind.
///
/// # Errors
///
/// Returns [`PdfError`] if rendering or writing the file fails.
pub fn write_report(
    path: &Path,
    records: &[AdjustedRecord],
    report_type: ReportType,
    flags: HeaderFeatureFlags,
) -> Result<bool, PdfError> {
    if records.is_empty() {
        log::warn!("No records to write, skipping {}", path.display());
        return Ok(false);
    }

    let bytes = render_report(records, report_type, flags)?;

    write_atomic(path, &bytes)?;

    log::info!(
        "Wrote {} rows ({} bytes) to {}",
        records.len(),
        bytes.len(),
        path.display()
    );
    Ok(true)
}

/// Writes `bytes` to a `.tmp` sibling of `path` and renames it into place.
///
/// The temporary file is removed on every error path, so `path` either
/// holds the complete contents or is left untouched.
///
/// # Errors
///
/// Returns the underlying I/O error if writing or renaming fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let result = std::fs::write(&tmp, bytes).and_then(|()| std::fs::rename(&tmp, path));
    if result.is_err() {
        std::fs::remove_file(&tmp).ok();
    }
    result
}

/// Renders the report into PDF bytes.
///
/// # Errors
///
/// Returns [`PdfError::Write`] if the document cannot be serialized.
pub fn render_report(
    records: &[AdjustedRecord],
    report_type: ReportType,
    flags: HeaderFeatureFlags,
) -> Result<Vec<u8>, PdfError> {
    let columns = columns_for(report_type, flags);
    let title = format!("Monthly attendance report - type {report_type}");

    let mut pages = Vec::new();
    let mut page = PageCanvas::new(&title, &columns);

    for record in records {
        if page.y - ROW_HEIGHT < USABLE_BOTTOM {
            pages.push(page.finish());
            page = PageCanvas::new(&title, &columns);
        }
        let cells: Vec<String> = columns.iter().map(|c| cell_text(record, c.key)).collect();
        page.row(&columns, &cells);
    }

    let (total, work_days) = totals(records);
    page.text(
        MARGIN,
        page.y - 10.0,
        &format!("Total hours: {total:.2} | Work days: {work_days}"),
    );
    pages.push(page.finish());

    log::debug!(
        "Rendered {} rows over {} page(s) with {} columns",
        records.len(),
        pages.len(),
        columns.len()
    );

    assemble_document(pages)
}

/// Content stream operations for one page, drawn top to bottom.
struct PageCanvas {
    ops: Vec<Operation>,
    y: f32,
}

impl PageCanvas {
    fn new(title: &str, columns: &[Column]) -> Self {
        let mut page = Self {
            ops: vec![Operation::new("w", vec![real(0.5)])],
            y: TABLE_TOP,
        };
        page.text(MARGIN, PAGE_HEIGHT - MARGIN, title);
        page.header(columns);
        page
    }

    fn header(&mut self, columns: &[Column]) {
        let width: f32 = columns.iter().map(|c| c.width_mm * MM).sum();
        let bottom = self.y - ROW_HEIGHT;

        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new("rg", vec![real(0.83), real(0.83), real(0.83)]));
        self.ops.push(Operation::new(
            "re",
            vec![real(MARGIN), real(bottom), real(width), real(ROW_HEIGHT)],
        ));
        self.ops.push(Operation::new("f", vec![]));
        self.ops.push(Operation::new("Q", vec![]));

        let mut x = MARGIN;
        for col in columns {
            let w = col.width_mm * MM;
            self.cell_border(x, bottom, w);
            self.text(x + TEXT_PAD, bottom + TEXT_PAD, col.title);
            x += w;
        }
        self.y = bottom;
    }

    fn row(&mut self, columns: &[Column], cells: &[String]) {
        let bottom = self.y - ROW_HEIGHT;
        let mut x = MARGIN;
        for (col, cell) in columns.iter().zip(cells) {
            let w = col.width_mm * MM;
            self.cell_border(x, bottom, w);
            let text_x = match col.align {
                Align::Left => x + TEXT_PAD,
                Align::Right => x + w - TEXT_PAD - text_width(cell),
            };
            self.text(text_x, bottom + TEXT_PAD, cell);
            x += w;
        }
        self.y = bottom;
    }

    fn cell_border(&mut self, x: f32, bottom: f32, width: f32) {
        self.ops.push(Operation::new(
            "re",
            vec![real(x), real(bottom), real(width), real(ROW_HEIGHT)],
        ));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn text(&mut self, x: f32, y: f32, text: &str) {
        let text = printable(text);
        if text.is_empty() {
            return;
        }
        self.ops.push(Operation::new("BT", vec![]));
        self.ops
            .push(Operation::new("Tf", vec![FONT_NAME.into(), real(FONT_SIZE)]));
        self.ops.push(Operation::new("Td", vec![real(x), real(y)]));
        self.ops
            .push(Operation::new("Tj", vec![Object::string_literal(text)]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn finish(self) -> Content {
        Content {
            operations: self.ops,
        }
    }
}

fn assemble_document(pages: Vec<Content>) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { FONT_NAME => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for content in pages {
        let stream = content
            .encode()
            .map_err(|e| PdfError::Write(format!("failed to encode page content: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, stream));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PdfError::Write(format!("failed to serialize document: {e}")))?;
    Ok(bytes)
}

const fn real(value: f32) -> Object {
    Object::Real(value)
}

/// Keeps printable ASCII, replacing everything else with `?`.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '?' })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn text_width(text: &str) -> f32 {
    text.chars().count() as f32 * FONT_SIZE * AVG_GLYPH_WIDTH
}
