//! Classification summary of a threshold policy.
//!
//! Treats Default as the positive class and Deny as a positive
//! prediction, so "recall on Default" is the share of bad loans the
//! policy turned away.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::strategy::payoff::ProfitEvaluator;
use crate::types::{validate_records, CreditError, Decision, DecisionPolicy, LoanRecord, Outcome};

/// 2×2 confusion counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Funded and repaid.
    pub funded_paid: usize,
    /// Funded and charged off.
    pub funded_default: usize,
    /// Denied but would have repaid.
    pub denied_paid: usize,
    /// Denied and would have charged off.
    pub denied_default: usize,
}

impl ConfusionMatrix {
    pub fn record(&mut self, decision: Decision, outcome: Outcome) {
        match (decision, outcome) {
            (Decision::Fund, Outcome::PaidInFull) => self.funded_paid += 1,
            (Decision::Fund, Outcome::Default) => self.funded_default += 1,
            (Decision::Deny, Outcome::PaidInFull) => self.denied_paid += 1,
            (Decision::Deny, Outcome::Default) => self.denied_default += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.funded_paid + self.funded_default + self.denied_paid + self.denied_default
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.funded_paid + self.denied_default, self.total())
    }
}

/// Precision / recall / F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn from_counts(true_pos: usize, false_pos: usize, false_neg: usize) -> Self {
        let precision = ratio(true_pos, true_pos + false_pos);
        let recall = ratio(true_pos, true_pos + false_neg);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support: true_pos + false_neg,
        }
    }
}

/// Performance of a single threshold policy on the scored population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub threshold: f64,
    pub confusion: ConfusionMatrix,
    pub paid_in_full: ClassMetrics,
    pub default: ClassMetrics,
    pub accuracy: f64,
    #[serde(with = "rust_decimal::serde::str")]
    pub net_profit: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_exposure: Decimal,
    /// `net_profit / total_exposure × 100`; 0 when nothing was disbursed.
    pub rate_of_return_pct: f64,
}

/// Summarize how `threshold` classifies `records` and what it earns.
pub fn summarize(
    records: &[LoanRecord],
    threshold: f64,
    evaluator: &ProfitEvaluator,
) -> Result<ClassificationSummary, CreditError> {
    if records.is_empty() {
        return Err(CreditError::insufficient("classification summary"));
    }
    validate_records(records)?;

    let policy = DecisionPolicy::new(threshold)?;
    let decisions = policy.decide_all(records);
    let net_profit = evaluator.evaluate(records, &decisions)?;

    let mut confusion = ConfusionMatrix::default();
    let mut total_exposure = Decimal::ZERO;
    for (record, &decision) in records.iter().zip(&decisions) {
        confusion.record(decision, record.outcome);
        total_exposure += record.exposure_amount.unwrap_or_default();
    }

    let default = ClassMetrics::from_counts(
        confusion.denied_default,
        confusion.denied_paid,
        confusion.funded_default,
    );
    let paid_in_full = ClassMetrics::from_counts(
        confusion.funded_paid,
        confusion.funded_default,
        confusion.denied_paid,
    );

    let rate_of_return_pct = if total_exposure.is_zero() {
        0.0
    } else {
        (net_profit / total_exposure * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0)
    };

    Ok(ClassificationSummary {
        threshold,
        confusion,
        paid_in_full,
        default,
        accuracy: confusion.accuracy(),
        net_profit,
        total_exposure,
        rate_of_return_pct,
    })
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_records() -> Vec<LoanRecord> {
        vec![
            LoanRecord::new(Outcome::PaidInFull, 0.1, dec!(1000)),
            LoanRecord::new(Outcome::Default, 0.6, dec!(2000)),
            LoanRecord::new(Outcome::PaidInFull, 0.3, dec!(500)),
            LoanRecord::new(Outcome::Default, 0.2, dec!(500)),
        ]
    }

    #[test]
    fn test_confusion_counts() {
        let summary = summarize(&make_records(), 0.5, &ProfitEvaluator::default()).unwrap();
        assert_eq!(
            summary.confusion,
            ConfusionMatrix {
                funded_paid: 2,
                funded_default: 1,
                denied_paid: 0,
                denied_default: 1,
            }
        );
        assert_eq!(summary.confusion.total(), 4);
        assert!((summary.accuracy - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_class_metrics() {
        let summary = summarize(&make_records(), 0.5, &ProfitEvaluator::default()).unwrap();
        // Default: TP=1 (denied_default), FP=0, FN=1 (funded_default)
        assert!((summary.default.precision - 1.0).abs() < 1e-12);
        assert!((summary.default.recall - 0.5).abs() < 1e-12);
        assert_eq!(summary.default.support, 2);
        // PIF: TP=2, FP=1, FN=0
        assert!((summary.paid_in_full.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((summary.paid_in_full.recall - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_profit_and_rate_of_return() {
        let summary = summarize(&make_records(), 0.5, &ProfitEvaluator::default()).unwrap();
        // 50 + 0 + 25 - 125
        assert_eq!(summary.net_profit, dec!(-50));
        assert_eq!(summary.total_exposure, dec!(4000));
        assert!((summary.rate_of_return_pct - (-1.25)).abs() < 1e-9);
    }

    #[test]
    fn test_no_positive_predictions_has_zero_precision() {
        // Nothing reaches 0.99, so nothing is denied.
        let summary = summarize(&make_records(), 0.99, &ProfitEvaluator::default()).unwrap();
        assert_eq!(summary.default.precision, 0.0);
        assert_eq!(summary.default.f1, 0.0);
    }

    #[test]
    fn test_empty_records() {
        assert!(summarize(&[], 0.5, &ProfitEvaluator::default()).is_err());
    }
}
