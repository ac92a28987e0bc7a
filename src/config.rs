//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section has defaults, so a missing section or key falls back to
//! the standard payoff table and threshold grid.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::data::csv::CsvColumns;
use crate::storage::DEFAULT_REPORT_FILE;
use crate::strategy::payoff::PayoffTable;
use crate::strategy::threshold::ThresholdConfig;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub payoff: PayoffTable,
    pub threshold: ThresholdConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    /// Scored file produced by the scoring pipeline.
    pub path: String,
    #[serde(flatten)]
    pub columns: CsvColumns,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: "scored_loans.csv".to_string(),
            columns: CsvColumns::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: DEFAULT_REPORT_FILE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub calibration_bins: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { calibration_bins: 10 }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }
}
