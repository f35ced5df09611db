//! Page text sources.
//!
//! Native text extraction ([`pdf_extract`]) is tried first for every page.
//! Pages whose native text does not look like an attendance table (no
//! dates, no times, hardly any words) are handed to an external OCR
//! command when one is configured. The OCR program is a black box: it gets
//! the PDF path and a 1-based page number and prints the page text.

use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::PdfError;

/// Minimum number of word characters for native text to be trusted on its
/// own.
pub const MIN_WORD_CHARS: usize = 20;

static DATE_LIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]\d{2,4}").expect("valid regex"));

static TIME_LIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}[:.：]\d{2}\b").expect("valid regex"));

static WORD_CHAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w").expect("valid regex"));

/// Anything that can turn a PDF into an ordered list of page texts.
pub trait TextSource {
    /// Returns the text of every page, in page order.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the file cannot be read or no text can be
    /// produced for it.
    fn pages(&self, path: &Path) -> Result<Vec<String>, PdfError>;
}

/// Text embedded in the PDF itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeTextSource;

impl TextSource for NativeTextSource {
    fn pages(&self, path: &Path) -> Result<Vec<String>, PdfError> {
        let bytes = std::fs::read(path)?;
        let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| {
            PdfError::Extraction(format!("failed to extract text from {}: {e}", path.display()))
        })?;

        log::debug!(
            "Extracted {} characters of native text over {} page(s) from {}",
            pages.iter().map(String::len).sum::<usize>(),
            pages.len(),
            path.display()
        );

        Ok(pages)
    }
}

/// An external OCR program invoked once per page.
///
/// Every argument has `{path}` replaced with the PDF path and `{page}`
/// with the 1-based page number. The program's stdout is the page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl OcrCommand {
    /// Runs OCR on one page.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Io`] if the program cannot be started and
    /// [`PdfError::Ocr`] if it exits unsuccessfully.
    pub fn run(&self, path: &Path, page: usize) -> Result<String, PdfError> {
        let path_str = path.display().to_string();
        let page_str = page.to_string();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace("{path}", &path_str).replace("{page}", &page_str))
            .collect();

        log::debug!("Running OCR: {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program).args(&args).output()?;
        if !output.status.success() {
            return Err(PdfError::Ocr(format!(
                "{} exited with {} on page {page} of {path_str}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Native text first, OCR for pages where native text is not usable.
#[derive(Debug, Default, Clone)]
pub struct LayeredTextSource {
    native: NativeTextSource,
    ocr: Option<OcrCommand>,
}

impl LayeredTextSource {
    #[must_use]
    pub const fn new(ocr: Option<OcrCommand>) -> Self {
        Self {
            native: NativeTextSource,
            ocr,
        }
    }

    fn ocr_page(&self, path: &Path, page: usize, native: String) -> String {
        let Some(ocr) = &self.ocr else {
            return native;
        };
        match ocr.run(path, page) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("OCR failed, keeping native text: {e}");
                native
            }
        }
    }
}

impl TextSource for LayeredTextSource {
    fn pages(&self, path: &Path) -> Result<Vec<String>, PdfError> {
        let native = match self.native.pages(path) {
            Ok(pages) => pages,
            Err(e) if self.ocr.is_some() => {
                log::warn!("Native extraction failed, falling back to OCR: {e}");
                vec![String::new(); page_count(path)?]
            }
            Err(e) => return Err(e),
        };

        Ok(native
            .into_iter()
            .enumerate()
            .map(|(idx, text)| {
                if looks_usable(&text) {
                    text
                } else {
                    log::debug!("Page {} has no usable native text", idx + 1);
                    self.ocr_page(path, idx + 1, text)
                }
            })
            .collect())
    }
}

/// Number of pages in the PDF at `path`.
///
/// # Errors
///
/// Returns [`PdfError::Extraction`] if the file is not a readable PDF.
pub fn page_count(path: &Path) -> Result<usize, PdfError> {
    let doc = lopdf::Document::load(path)
        .map_err(|e| PdfError::Extraction(format!("failed to load {}: {e}", path.display())))?;
    Ok(doc.get_pages().len())
}

/// Whether native page text is good enough to skip OCR.
#[must_use]
pub fn looks_usable(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    DATE_LIKE_RE.is_match(text)
        || TIME_LIKE_RE.is_match(text)
        || WORD_CHAR_RE.find_iter(text).count() > MIN_WORD_CHARS
}

#[cfg(test)]
mod tests {
    use lopdf::{Document, Object, Stream, dictionary};

    use super::*;

    fn blank_pdf(name: &str) -> std::path::PathBuf {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {},
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => Object::Integer(1),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let path = std::env::temp_dir().join(format!(
            "attendance_report_{name}_{}.pdf",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        doc.save_to(&mut file).unwrap();
        path
    }

    fn ocr(program: &str, args: &[&str]) -> Option<OcrCommand> {
        Some(OcrCommand {
            program: program.to_owned(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
        })
    }

    #[test]
    fn dates_or_times_make_text_usable() {
        assert!(looks_usable("01/03/2023"));
        assert!(looks_usable("08:30"));
        assert!(looks_usable("08：30"));
    }

    #[test]
    fn wordy_text_is_usable() {
        assert!(looks_usable("this page has plenty of words on it"));
        assert!(!looks_usable("few words"));
        assert!(!looks_usable("   \n  "));
    }

    #[test]
    fn ocr_command_substitutes_placeholders() {
        let ocr = OcrCommand {
            program: "echo".to_owned(),
            args: vec!["{path}".to_owned(), "page={page}".to_owned()],
        };
        let text = ocr.run(Path::new("in/report.pdf"), 3).unwrap();
        assert_eq!(text.trim(), "in/report.pdf page=3");
    }

    #[test]
    fn failing_ocr_command_is_an_error() {
        let ocr = OcrCommand {
            program: "false".to_owned(),
            args: Vec::new(),
        };
        assert!(matches!(
            ocr.run(Path::new("x.pdf"), 1),
            Err(PdfError::Ocr(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let source = LayeredTextSource::new(None);
        assert!(matches!(
            source.pages(Path::new("does/not/exist.pdf")),
            Err(PdfError::Io(_))
        ));
    }

    #[test]
    fn blank_page_is_read_with_ocr() {
        let path = blank_pdf("ocr_blank");
        let source = LayeredTextSource::new(ocr("echo", &["1/3/2023 08:00 16:30 p{page}"]));

        let pages = source.pages(&path).unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].trim(), "1/3/2023 08:00 16:30 p1");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn failing_ocr_keeps_native_text() {
        let path = blank_pdf("ocr_failing");
        let source = LayeredTextSource::new(ocr("false", &[]));

        let pages = source.pages(&path).unwrap();

        assert_eq!(pages.len(), 1);
        assert!(!looks_usable(&pages[0]));
        assert_eq!(page_count(&path).unwrap(), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn blank_page_without_ocr_stays_blank() {
        let path = blank_pdf("no_ocr");
        let pages = LayeredTextSource::new(None).pages(&path).unwrap();

        assert_eq!(pages.len(), 1);
        assert!(pages[0].trim().is_empty());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unreadable_pdf_with_ocr_needs_a_page_count() {
        let junk = std::env::temp_dir().join(format!(
            "attendance_report_junk_{}.pdf",
            std::process::id()
        ));
        std::fs::write(&junk, b"not a pdf").unwrap();
        let source = LayeredTextSource::new(ocr("echo", &["page {page}"]));

        assert!(matches!(source.pages(&junk), Err(PdfError::Extraction(_))));
        std::fs::remove_file(&junk).ok();
    }
}
