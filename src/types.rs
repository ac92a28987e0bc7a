//! Shared types for LENDSCORE.
//!
//! These types form the data model used across all modules: scored loan
//! records, fund/deny decisions, the threshold policy, and the error
//! taxonomy surfaced to callers. Records are immutable once scored; every
//! stage receives them by shared reference.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// True repayment outcome of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Loan fully repaid (PIF).
    PaidInFull,
    /// Loan charged off (CHGOFF).
    Default,
}

impl Outcome {
    /// Whether this is the unfavorable (positive-class) outcome.
    pub fn is_default(&self) -> bool {
        matches!(self, Outcome::Default)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::PaidInFull => write!(f, "PIF"),
            Outcome::Default => write!(f, "CHGOFF"),
        }
    }
}

/// Parse the labels used by loan-status columns (case-insensitive).
impl std::str::FromStr for Outcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "pif" | "paidinfull" | "paid" | "0" => Ok(Outcome::PaidInFull),
            "chgoff" | "chargeoff" | "chargedoff" | "default" | "1" => Ok(Outcome::Default),
            _ => Err(anyhow::anyhow!("Unknown loan outcome: {s}")),
        }
    }
}

/// Binary credit decision for one application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Fund,
    Deny,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Fund => write!(f, "FUND"),
            Decision::Deny => write!(f, "DENY"),
        }
    }
}

// ---------------------------------------------------------------------------
// Loan record
// ---------------------------------------------------------------------------

/// A scored loan application as supplied by the scoring pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    /// Optional identifier, used only for reporting.
    #[serde(default)]
    pub loan_id: Option<String>,
    pub outcome: Outcome,
    /// Predicted probability of default (0.0–1.0).
    pub predicted_default_probability: f64,
    /// Disbursed principal. `None` when the source had no amount.
    pub exposure_amount: Option<Decimal>,
}

impl fmt::Display for LoanRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = match self.exposure_amount {
            Some(a) => format!("${a:.2}"),
            None => "missing".to_string(),
        };
        write!(
            f,
            "[{}] {} P(default)={:.1}% amount={}",
            self.loan_id.as_deref().unwrap_or("-"),
            self.outcome,
            self.predicted_default_probability * 100.0,
            amount,
        )
    }
}

impl LoanRecord {
    pub fn new(outcome: Outcome, predicted_default_probability: f64, exposure_amount: Decimal) -> Self {
        Self {
            loan_id: None,
            outcome,
            predicted_default_probability,
            exposure_amount: Some(exposure_amount),
        }
    }

    /// Attach a reporting identifier.
    pub fn with_id(mut self, loan_id: impl Into<String>) -> Self {
        self.loan_id = Some(loan_id.into());
        self
    }

    /// `1 - P(default)`, used to rank from least to most risky.
    pub fn predicted_success_probability(&self) -> f64 {
        1.0 - self.predicted_default_probability
    }

    /// Build records from three aligned columns.
    pub fn from_columns(
        outcomes: &[Outcome],
        probabilities: &[f64],
        amounts: &[Option<Decimal>],
    ) -> Result<Vec<LoanRecord>, CreditError> {
        if outcomes.len() != probabilities.len() {
            return Err(InputViolation::LengthMismatch {
                left_name: "outcomes",
                left: outcomes.len(),
                right_name: "probabilities",
                right: probabilities.len(),
            }
            .into());
        }
        if outcomes.len() != amounts.len() {
            return Err(InputViolation::LengthMismatch {
                left_name: "outcomes",
                left: outcomes.len(),
                right_name: "amounts",
                right: amounts.len(),
            }
            .into());
        }

        Ok(outcomes
            .iter()
            .zip(probabilities)
            .zip(amounts)
            .map(|((&outcome, &p), &amount)| LoanRecord {
                loan_id: None,
                outcome,
                predicted_default_probability: p,
                exposure_amount: amount,
            })
            .collect())
    }

    /// The exposure amount, or the violated contract for record `index`.
    pub fn checked_amount(&self, index: usize) -> Result<Decimal, InputViolation> {
        match self.exposure_amount {
            None => Err(InputViolation::MissingExposure { index }),
            Some(amount) if amount.is_sign_negative() && !amount.is_zero() => {
                Err(InputViolation::NegativeExposure { index, amount })
            }
            Some(amount) => Ok(amount),
        }
    }

    /// The predicted default probability, or the violated contract.
    pub fn checked_probability(&self, index: usize) -> Result<f64, InputViolation> {
        let value = self.predicted_default_probability;
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(InputViolation::ProbabilityOutOfRange { index, value })
        }
    }
}

/// Validate every record's amount and probability, failing on the first
/// violation in input order.
pub fn validate_records(records: &[LoanRecord]) -> Result<(), CreditError> {
    for (index, record) in records.iter().enumerate() {
        record.checked_amount(index)?;
        record.checked_probability(index)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Decision policy
// ---------------------------------------------------------------------------

/// Single-threshold policy: deny iff `P(default) >= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    threshold: f64,
}

impl fmt::Display for DecisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deny if P(default) >= {:.2}", self.threshold)
    }
}

impl DecisionPolicy {
    pub fn new(threshold: f64) -> Result<Self, CreditError> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(InputViolation::ThresholdOutOfRange { value: threshold }.into());
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn decide(&self, predicted_default_probability: f64) -> Decision {
        if predicted_default_probability >= self.threshold {
            Decision::Deny
        } else {
            Decision::Fund
        }
    }

    /// Decision vector aligned to `records`.
    pub fn decide_all(&self, records: &[LoanRecord]) -> Vec<Decision> {
        records
            .iter()
            .map(|r| self.decide(r.predicted_default_probability))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// The specific input contract that was violated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputViolation {
    #[error("exposure amount missing for record #{index}")]
    MissingExposure { index: usize },

    #[error("exposure amount {amount} is negative for record #{index}")]
    NegativeExposure { index: usize, amount: Decimal },

    #[error("predicted default probability {value} outside [0, 1] for record #{index}")]
    ProbabilityOutOfRange { index: usize, value: f64 },

    #[error("threshold {value} outside [0, 1]")]
    ThresholdOutOfRange { value: f64 },

    #[error("length mismatch: {left_name} has {left} entries, {right_name} has {right}")]
    LengthMismatch {
        left_name: &'static str,
        left: usize,
        right_name: &'static str,
        right: usize,
    },

    #[error("baseline average profit is zero; profit lift is undefined")]
    ZeroBaseline,

    #[error("profit overflowed at record #{index}")]
    ProfitOverflow { index: usize },

    #[error("no candidate threshold produced an evaluable profit")]
    NoEvaluableThreshold,

    #[error("threshold grid is empty (steps={steps}, resolution={resolution})")]
    EmptyGrid { steps: u32, resolution: u32 },
}

/// Errors surfaced by the decision core. Both kinds are fail-fast.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CreditError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputViolation),

    #[error("Insufficient data: {operation} requires at least one record")]
    InsufficientData { operation: &'static str },
}

impl CreditError {
    pub fn insufficient(operation: &'static str) -> Self {
        CreditError::InsufficientData { operation }
    }

    /// The violated input contract, if this is an input error.
    pub fn violation(&self) -> Option<&InputViolation> {
        match self {
            CreditError::InvalidInput(v) => Some(v),
            CreditError::InsufficientData { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
