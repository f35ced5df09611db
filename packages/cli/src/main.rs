#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch converter from attendance report PDFs to varied PDF tables.
//!
//! Reads every report in the input directory (or a single named one),
//! extracts its attendance rows, applies the per-type variation rules and
//! writes `<stem>_variation.pdf` to the output directory.
//!
//! Logging goes through `indicatif-log-bridge` (via
//! [`attendance_report_cli_utils::init_logger`]) so log lines and the
//! batch progress bar share the terminal cleanly.

mod config;
mod pipeline;

use std::path::PathBuf;
use std::str::FromStr as _;
use std::time::Instant;

use attendance_report_cli_utils::IndicatifProgress;
use attendance_report_models::ReportTypePolicy;
use attendance_report_pdf::source::LayeredTextSource;
use clap::Parser;

use crate::config::Config;
use crate::pipeline::{RunOptions, collect_inputs, run_batch};

#[derive(Parser)]
#[command(
    name = "attendance_report",
    about = "Generate varied attendance report PDFs"
)]
struct Cli {
    /// Single report to process, relative to the input directory. All PDFs
    /// in the input directory are processed when omitted.
    file: Option<PathBuf>,
    /// TOML config file (defaults are built in)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory to read report PDFs from
    #[arg(long)]
    input_dir: Option<PathBuf>,
    /// Directory to write generated reports to (created if missing)
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Report type policy: `run-length` or `sabbath-marker`
    #[arg(long, value_parser = parse_policy)]
    policy: Option<ReportTypePolicy>,
    /// Also write the adjusted records as `<stem>_records.json`
    #[arg(long)]
    emit_json: bool,
}

fn parse_policy(value: &str) -> Result<ReportTypePolicy, String> {
    ReportTypePolicy::from_str(&value.replace('-', "_"))
        .map_err(|_| format!("unknown policy '{value}' (expected run-length or sabbath-marker)"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = attendance_report_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.input_dir {
        config.input_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(policy) = cli.policy {
        config.report_type_policy = policy;
    }

    let inputs = if let Some(file) = &cli.file {
        let path = config.input_dir.join(file);
        if !path.is_file() {
            log::error!("Input file not found: {}", path.display());
            return Ok(());
        }
        vec![path]
    } else {
        if !config.input_dir.is_dir() {
            log::error!("Input directory not found: {}", config.input_dir.display());
            return Ok(());
        }
        collect_inputs(&config.input_dir)?
    };

    if inputs.is_empty() {
        log::warn!("No PDF files in {}", config.input_dir.display());
        return Ok(());
    }

    log::info!(
        "Processing {} report(s) with {} policy",
        inputs.len(),
        config.report_type_policy
    );

    let source = LayeredTextSource::new(config.ocr.clone());
    let output_dir = config.output_dir.clone();
    let options = RunOptions {
        config,
        emit_json: cli.emit_json,
    };
    let progress = IndicatifProgress::files_bar(&multi, "Reports");

    let start = Instant::now();
    let summary = run_batch(&source, &inputs, &output_dir, &options, &progress)?;

    log::info!(
        "Done in {:.1}s: {} written, {} empty, {} failed",
        start.elapsed().as_secs_f64(),
        summary.written,
        summary.empty,
        summary.failed
    );

    Ok(())
}
