//! Run configuration loaded from TOML.
//!
//! The defaults in `config/default.toml` are compiled into the binary. A
//! file given with `--config` is parsed on its own; keys it leaves out keep
//! their default values.

use std::path::{Path, PathBuf};

use attendance_report_models::{ReportTypePolicy, YearPivot};
use attendance_report_pdf::source::OcrCommand;
use serde::{Deserialize, Serialize};

/// Embedded default configuration.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid configuration TOML.
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub report_type_policy: ReportTypePolicy,
    pub year_pivot: YearPivot,
    pub ocr: Option<OcrCommand>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input_reports"),
            output_dir: PathBuf::from("output_reports"),
            report_type_policy: ReportTypePolicy::default(),
            year_pivot: YearPivot::default(),
            ocr: None,
        }
    }
}

impl Config {
    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the string is not valid TOML or has
    /// unknown enum values.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Loads `path` if given, the embedded defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Self::parse(DEFAULT_CONFIG_TOML);
        };
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents)?;
        log::debug!("Loaded config from {}: {config:?}", path.display());
        Ok(config)
    }
}
