//! Score diagnostics.
//!
//! Measures how well the supplied default probabilities match realized
//! outcomes: Brier score, a binned calibration curve, and the ROC AUC of
//! the scores as a ranking of bad loans above good ones. Read-only: the
//! scores themselves are never adjusted here.

use serde::{Deserialize, Serialize};

use crate::types::LoanRecord;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Diagnostics over a scored population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDiagnostics {
    pub total_records: usize,
    pub default_count: usize,
    pub brier_score: f64,
    /// `None` when only one outcome class is present.
    pub roc_auc: Option<f64>,
    pub calibration_curve: Vec<CalibrationBucket>,
}

/// A bucket in the calibration curve (e.g. all scores in 0.60–0.70).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBucket {
    pub bin_start: f64,
    pub bin_end: f64,
    pub mean_predicted: f64,
    pub actual_default_rate: f64,
    pub count: usize,
    /// |mean_predicted - actual_default_rate|
    pub deviation: f64,
}

// ---------------------------------------------------------------------------
// Calibrator
// ---------------------------------------------------------------------------

pub struct Calibrator {
    /// Number of bins for the calibration curve.
    num_bins: usize,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Calibrator {
    pub fn new(num_bins: usize) -> Self {
        Self {
            num_bins: num_bins.max(1),
        }
    }

    /// Generate the full diagnostics for `records`.
    pub fn report(&self, records: &[LoanRecord]) -> ScoreDiagnostics {
        let default_count = records.iter().filter(|r| r.outcome.is_default()).count();
        if records.is_empty() {
            return ScoreDiagnostics {
                total_records: 0,
                default_count: 0,
                brier_score: 0.0,
                roc_auc: None,
                calibration_curve: Vec::new(),
            };
        }

        ScoreDiagnostics {
            total_records: records.len(),
            default_count,
            brier_score: brier_score(records),
            roc_auc: roc_auc(records),
            calibration_curve: self.compute_calibration_curve(records),
        }
    }

    /// Bin scores and compare each bin's mean score to its default rate.
    fn compute_calibration_curve(&self, records: &[LoanRecord]) -> Vec<CalibrationBucket> {
        let bin_width = 1.0 / self.num_bins as f64;
        let mut buckets = Vec::with_capacity(self.num_bins);

        for i in 0..self.num_bins {
            let bin_start = i as f64 * bin_width;
            let bin_end = bin_start + bin_width;
            let last = i == self.num_bins - 1;

            let in_bin: Vec<&LoanRecord> = records
                .iter()
                .filter(|r| {
                    let p = r.predicted_default_probability;
                    p >= bin_start && (p < bin_end || (last && p <= bin_end))
                })
                .collect();

            if in_bin.is_empty() {
                buckets.push(CalibrationBucket {
                    bin_start,
                    bin_end,
                    mean_predicted: (bin_start + bin_end) / 2.0,
                    actual_default_rate: 0.0,
                    count: 0,
                    deviation: 0.0,
                });
                continue;
            }

            let count = in_bin.len();
            let mean_predicted = in_bin
                .iter()
                .map(|r| r.predicted_default_probability)
                .sum::<f64>()
                / count as f64;
            let actual_default_rate =
                in_bin.iter().filter(|r| r.outcome.is_default()).count() as f64 / count as f64;

            buckets.push(CalibrationBucket {
                bin_start,
                bin_end,
                mean_predicted,
                actual_default_rate,
                count,
                deviation: (mean_predicted - actual_default_rate).abs(),
            });
        }

        buckets
    }
}

/// Brier = (1/N) * Σ(predicted - outcome)². 0.0 = perfect.
pub fn brier_score(records: &[LoanRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let sum: f64 = records
        .iter()
        .map(|r| {
            let outcome = if r.outcome.is_default() { 1.0 } else { 0.0 };
            (r.predicted_default_probability - outcome).powi(2)
        })
        .sum();
    sum / records.len() as f64
}

/// Area under the ROC curve via the rank-sum statistic, ties averaged.
pub fn roc_auc(records: &[LoanRecord]) -> Option<f64> {
    let positives = records.iter().filter(|r| r.outcome.is_default()).count();
    let negatives = records.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut scored: Vec<(f64, bool)> = records
        .iter()
        .map(|r| (r.predicted_default_probability, r.outcome.is_default()))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Sum of 1-based ranks of positives; tied scores share the mean rank.
    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < scored.len() {
        let mut end = start;
        while end + 1 < scored.len() && scored[end + 1].0 == scored[start].0 {
            end += 1;
        }
        let mean_rank = (start + end) as f64 / 2.0 + 1.0;
        let tied_positives = scored[start..=end].iter().filter(|(_, pos)| *pos).count();
        positive_rank_sum += mean_rank * tied_positives as f64;
        start = end + 1;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;
    use rust_decimal_macros::dec;

    fn make_record(p_default: f64, defaulted: bool) -> LoanRecord {
        let outcome = if defaulted { Outcome::Default } else { Outcome::PaidInFull };
        LoanRecord::new(outcome, p_default, dec!(1000))
    }

    #[test]
    fn test_sharp_scores_low_brier() {
        let mut records = Vec::new();
        for _ in 0..10 {
            records.push(make_record(0.90, true));
            records.push(make_record(0.10, false));
        }
        let report = Calibrator::default().report(&records);
        assert!(report.brier_score < 0.05, "Brier: {}", report.brier_score);
        assert_eq!(report.default_count, 10);
    }

    #[test]
    fn test_inverted_scores_high_brier() {
        let mut records = Vec::new();
        for _ in 0..10 {
            records.push(make_record(0.90, false));
            records.push(make_record(0.10, true));
        }
        let report = Calibrator::default().report(&records);
        assert!(report.brier_score > 0.5, "Brier: {}", report.brier_score);
        assert_eq!(report.roc_auc, Some(0.0));
    }

    #[test]
    fn test_empty_population() {
        let report = Calibrator::default().report(&[]);
        assert_eq!(report.total_records, 0);
        assert_eq!(report.roc_auc, None);
        assert!(report.calibration_curve.is_empty());
    }

    #[test]
    fn test_calibration_curve_buckets() {
        let mut records = Vec::new();
        for _ in 0..10 {
            records.push(make_record(0.25, true));
            records.push(make_record(0.75, false));
        }
        let report = Calibrator::default().report(&records);
        assert_eq!(report.calibration_curve.len(), 10);

        let bucket_25 = report
            .calibration_curve
            .iter()
            .find(|b| b.bin_start <= 0.25 && b.bin_end > 0.25)
            .unwrap();
        assert_eq!(bucket_25.count, 10);
        assert!((bucket_25.actual_default_rate - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_probability_one_lands_in_last_bucket() {
        let records = vec![make_record(1.0, true)];
        let report = Calibrator::new(4).report(&records);
        assert_eq!(report.calibration_curve[3].count, 1);
    }

    #[test]
    fn test_brier_score_at_50() {
        let mut records = Vec::new();
        for _ in 0..50 {
            records.push(make_record(0.50, true));
            records.push(make_record(0.50, false));
        }
        assert!((brier_score(&records) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_perfect_and_tied() {
        let perfect = vec![
            make_record(0.9, true),
            make_record(0.8, true),
            make_record(0.2, false),
            make_record(0.1, false),
        ];
        assert_eq!(roc_auc(&perfect), Some(1.0));

        let tied = vec![make_record(0.5, true), make_record(0.5, false)];
        assert_eq!(roc_auc(&tied), Some(0.5));
    }

    #[test]
    fn test_roc_auc_partial_ordering() {
        // One of four positive/negative pairs is mis-ordered.
        let records = vec![
            make_record(0.9, true),
            make_record(0.4, true),
            make_record(0.6, false),
            make_record(0.1, false),
        ];
        assert_eq!(roc_auc(&records), Some(0.75));
    }

    #[test]
    fn test_roc_auc_single_class() {
        let records = vec![make_record(0.3, false), make_record(0.4, false)];
        assert_eq!(roc_auc(&records), None);
    }
}
