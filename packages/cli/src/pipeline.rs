//! Per-document processing and the batch loop around it.
//!
//! One document goes through: page text, header features from the first
//! page, record extraction from the full text, report type classification,
//! variation rules, and finally the PDF table (plus optional JSON dump).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use attendance_report_cli_utils::ProgressCallback;
use attendance_report_extract::{extract_records, features::detect_features, layout};
use attendance_report_models::{LayoutMode, ReportType, ReportTypePolicy};
use attendance_report_pdf::PdfError;
use attendance_report_pdf::source::TextSource;
use attendance_report_pdf::writer::{write_atomic, write_report};
use attendance_report_rules::apply_rules;

use crate::config::Config;

/// Suffix appended to the input stem for the rendered report.
pub const PDF_SUFFIX: &str = "_variation.pdf";

/// Suffix appended to the input stem for the JSON record dump.
pub const JSON_SUFFIX: &str = "_records.json";

/// Errors that abort processing of a single document.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No page of the document produced any text.
    #[error("no text could be read from {0}")]
    EmptyText(PathBuf),
}

/// Options shared by every document in a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: Config,
    pub emit_json: bool,
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    pub report_type: ReportType,
    pub layout: LayoutMode,
    pub rows: usize,
    /// Set when the PDF was written; empty extractions write nothing.
    pub pdf_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
}

/// Totals over a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub written: usize,
    pub empty: usize,
    pub failed: usize,
}

/// Output file paths for `input` inside `output_dir`.
#[must_use]
pub fn output_paths(input: &Path, output_dir: &Path) -> (PathBuf, PathBuf) {
    let stem = input
        .file_stem()
        .map_or_else(|| "report".into(), |s| s.to_string_lossy());
    (
        output_dir.join(format!("{stem}{PDF_SUFFIX}")),
        output_dir.join(format!("{stem}{JSON_SUFFIX}")),
    )
}

/// Every `.pdf` file (any case) directly inside `dir`, sorted by name.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the directory cannot be listed.
pub fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Processes one report PDF into `output_dir`.
///
/// # Errors
///
/// Returns [`PipelineError`] if the input cannot be read, yields no text,
/// or the outputs cannot be written.
pub fn process_report(
    source: &dyn TextSource,
    input: &Path,
    output_dir: &Path,
    options: &RunOptions,
) -> Result<ReportOutcome, PipelineError> {
    let config = &options.config;
    let pages = source.pages(input)?;
    let text = pages.join("\n");
    if text.trim().is_empty() {
        return Err(PipelineError::EmptyText(input.to_path_buf()));
    }
    let first_page = pages.first().map_or("", String::as_str);

    let flags = detect_features(first_page);
    let extraction = extract_records(&text, config.year_pivot);

    let classified_text = match config.report_type_policy {
        ReportTypePolicy::RunLength => text.as_str(),
        ReportTypePolicy::SabbathMarker => first_page,
    };
    let report_type =
        layout::classify_report_type(classified_text, config.report_type_policy, config.year_pivot);

    log::debug!(
        "{}: {} pages, {} records, {} layout, type {report_type}",
        input.display(),
        pages.len(),
        extraction.records.len(),
        extraction.layout,
    );

    if extraction.is_empty() {
        log::warn!("No attendance rows found in {}", input.display());
    }

    let outcome = apply_rules(&extraction.records, report_type);
    let (pdf_path, json_path) = output_paths(input, output_dir);

    let json = if options.emit_json {
        Some(serde_json::to_string_pretty(&outcome.records)?)
    } else {
        None
    };

    let written = write_report(&pdf_path, &outcome.records, report_type, flags)?;

    let json_path = match json {
        Some(json) if written => {
            if let Err(e) = write_atomic(&json_path, json.as_bytes()) {
                std::fs::remove_file(&pdf_path).ok();
                return Err(e.into());
            }
            Some(json_path)
        }
        _ => None,
    };

    Ok(ReportOutcome {
        report_type,
        layout: extraction.layout,
        rows: outcome.records.len(),
        pdf_path: written.then_some(pdf_path),
        json_path,
    })
}

/// Processes every input in order. Failures are logged and counted, never
/// propagated.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] only if `output_dir` cannot be created.
pub fn run_batch(
    source: &dyn TextSource,
    inputs: &[PathBuf],
    output_dir: &Path,
    options: &RunOptions,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<BatchSummary, PipelineError> {
    std::fs::create_dir_all(output_dir)?;
    progress.set_total(inputs.len() as u64);

    let mut summary = BatchSummary::default();
    for input in inputs {
        let name = input
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        progress.set_message(name);

        match process_report(source, input, output_dir, options) {
            Ok(ReportOutcome {
                pdf_path: Some(path),
                json_path,
                report_type,
                layout,
                rows,
            }) => {
                log::info!(
                    "{} -> {} (type {report_type}, {layout} layout, {rows} rows)",
                    input.display(),
                    path.display()
                );
                if let Some(json_path) = json_path {
                    log::debug!("Records written to {}", json_path.display());
                }
                summary.written += 1;
            }
            Ok(_) => {
                log::warn!("Skipped {}: nothing to write", input.display());
                summary.empty += 1;
            }
            Err(e) => {
                log::warn!("Failed to process {}: {e}", input.display());
                summary.failed += 1;
            }
        }
        progress.inc(1);
    }

    progress.finish(format!(
        "{} written, {} empty, {} failed",
        summary.written, summary.empty, summary.failed
    ));
    Ok(summary)
}
