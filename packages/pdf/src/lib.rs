#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PDF input and output for attendance reports.
//!
//! [`source`] turns a report PDF into page texts, using the embedded text
//! layer when it is usable and an external OCR command otherwise.
//! [`writer`] renders adjusted records back into a paginated PDF table.

pub mod source;
pub mod writer;

/// Errors from reading or writing report PDFs.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// The OCR command failed.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// The output document could not be produced.
    #[error("PDF write error: {0}")]
    Write(String),
}
