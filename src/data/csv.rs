//! CSV-backed scored record provider.
//!
//! Reads the scoring pipeline's output file. Columns are looked up by
//! header name; currency formatting (`$`, `,`) in the amount column is
//! stripped. A blank amount cell becomes a missing amount, which the core
//! reports by record index rather than failing here.

use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use super::ScoredRecordProvider;
use crate::types::{LoanRecord, Outcome};

/// Column layout of the scored file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CsvColumns {
    pub outcome_column: String,
    pub probability_column: String,
    pub amount_column: String,
    pub id_column: Option<String>,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            outcome_column: "MIS_Status".to_string(),
            probability_column: "p_default".to_string(),
            amount_column: "DisbursementGross".to_string(),
            id_column: Some("LoanNr_ChkDgt".to_string()),
        }
    }
}

pub struct CsvProvider {
    path: PathBuf,
    columns: CsvColumns,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>, columns: CsvColumns) -> Self {
        Self {
            path: path.into(),
            columns,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse records from any reader carrying a header row.
    pub fn parse<R: std::io::Read>(reader: R, columns: &CsvColumns) -> Result<Vec<LoanRecord>> {
        let mut reader = ::csv::ReaderBuilder::new()
            .trim(::csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers().context("Failed to read CSV header")?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| anyhow!("Missing column in scored file: {name}"))
        };
        let outcome_idx = position(&columns.outcome_column)?;
        let probability_idx = position(&columns.probability_column)?;
        let amount_idx = position(&columns.amount_column)?;
        // The id column is optional in the file even when configured.
        let id_idx = columns
            .id_column
            .as_deref()
            .and_then(|name| headers.iter().position(|h| h == name));

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let line = row + 2; // header is line 1
            let record = result.with_context(|| format!("Failed to read CSV line {line}"))?;
            let field = |idx: usize| record.get(idx).unwrap_or("");

            let outcome = Outcome::from_str(field(outcome_idx))
                .with_context(|| format!("Invalid outcome on line {line}"))?;
            let predicted_default_probability = field(probability_idx)
                .parse::<f64>()
                .with_context(|| format!("Invalid probability on line {line}"))?;
            let exposure_amount = parse_amount(field(amount_idx))
                .with_context(|| format!("Invalid amount on line {line}"))?;
            let loan_id = id_idx
                .map(|idx| field(idx).to_string())
                .filter(|id| !id.is_empty());

            records.push(LoanRecord {
                loan_id,
                outcome,
                predicted_default_probability,
                exposure_amount,
            });
        }

        debug!(rows = records.len(), "Scored CSV parsed");
        Ok(records)
    }
}

impl ScoredRecordProvider for CsvProvider {
    fn load_records(&self) -> Result<Vec<LoanRecord>> {
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("Failed to open scored file: {}", self.path.display()))?;
        let records = Self::parse(file, &self.columns)
            .with_context(|| format!("Failed to parse scored file: {}", self.path.display()))?;
        info!(path = %self.path.display(), records = records.len(), "Scored records loaded");
        Ok(records)
    }

    fn source_name(&self) -> String {
        self.path.display().to_string()
    }
}

/// `"$1,234.50"` → `Some(1234.50)`; blank → `None`.
fn parse_amount(raw: &str) -> Result<Option<Decimal>> {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    Decimal::from_str(cleaned)
        .map(Some)
        .map_err(|e| anyhow!("{e}: {raw}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
