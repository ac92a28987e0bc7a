//! Capital allocation ranking (gains / lift curve).
//!
//! Ranks loans from least to most risky by predicted success probability
//! and accumulates the profit realized if the top-k loans are funded.
//! The curve prices funded loans only; it never charges for denial.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::payoff::PayoffTable;
use crate::types::{validate_records, CreditError, InputViolation, LoanRecord};

// ---------------------------------------------------------------------------
// Curve types
// ---------------------------------------------------------------------------

/// One rank of the allocation curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationPoint {
    /// 1-based position in the risk-sorted order.
    pub rank: usize,
    /// Position of the record in the caller's input.
    pub record_index: usize,
    pub success_probability: f64,
    /// `rank / N`
    pub cumulative_fraction: f64,
    #[serde(with = "rust_decimal::serde::str")]
    pub cumulative_profit: Decimal,
    /// `cumulative_profit / rank`
    #[serde(with = "rust_decimal::serde::str")]
    pub cumulative_average_profit: Decimal,
    /// `cumulative_average_profit / baseline_average_profit`
    pub profit_lift: f64,
}

/// Allocation curve plus its profit-maximizing funding point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    pub best_fraction: f64,
    /// Success probability of the last loan funded at the best fraction.
    pub best_cutoff: f64,
    #[serde(with = "rust_decimal::serde::str")]
    pub best_cumulative_profit: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub baseline_average_profit: Decimal,
    pub curve: Vec<AllocationPoint>,
}

impl AllocationReport {
    /// The curve point at which cumulative profit peaks.
    pub fn best_point(&self) -> Option<&AllocationPoint> {
        self.curve
            .iter()
            .find(|p| p.cumulative_fraction == self.best_fraction)
    }

    /// Number of loans funded at the best fraction.
    pub fn funded_count(&self) -> usize {
        self.best_point().map(|p| p.rank).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Ranker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AllocationRanker {
    payoff: PayoffTable,
}

impl AllocationRanker {
    pub fn new(payoff: PayoffTable) -> Self {
        Self { payoff }
    }

    /// Input positions sorted by success probability, descending.
    ///
    /// The sort is stable, so equal scores keep their input order.
    pub fn risk_order(records: &[LoanRecord]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by(|&a, &b| {
            records[b]
                .predicted_success_probability()
                .total_cmp(&records[a].predicted_success_probability())
        });
        order
    }

    /// Build the allocation curve and locate the profit-maximizing fraction.
    pub fn rank(&self, records: &[LoanRecord]) -> Result<AllocationReport, CreditError> {
        if records.is_empty() {
            return Err(CreditError::insufficient("capital allocation ranking"));
        }
        validate_records(records)?;

        let n = records.len();
        let order = Self::risk_order(records);

        // Prefix sums of funded profit, in risk order.
        let mut cumulative = Vec::with_capacity(n);
        let mut running = Decimal::ZERO;
        for &index in &order {
            let record = &records[index];
            let amount = record.checked_amount(index)?;
            running = self
                .payoff
                .checked_funded_profit(record.outcome, amount)
                .and_then(|profit| running.checked_add(profit))
                .ok_or(InputViolation::ProfitOverflow { index })?;
            cumulative.push(running);
        }

        let total = running;
        let baseline = total / Decimal::from(n);
        if baseline.is_zero() {
            return Err(InputViolation::ZeroBaseline.into());
        }

        let mut curve = Vec::with_capacity(n);
        let mut best_rank = 0usize;
        for (i, (&index, &cumulative_profit)) in order.iter().zip(&cumulative).enumerate() {
            let rank = i + 1;
            let cumulative_average_profit = cumulative_profit / Decimal::from(rank);
            // A tiny non-zero baseline can push the ratio past Decimal::MAX.
            let profit_lift = cumulative_average_profit
                .checked_div(baseline)
                .ok_or(InputViolation::ProfitOverflow { index })?
                .to_f64()
                .unwrap_or(f64::NAN);

            if cumulative_profit > cumulative[best_rank] {
                best_rank = i;
            }

            curve.push(AllocationPoint {
                rank,
                record_index: index,
                success_probability: records[index].predicted_success_probability(),
                cumulative_fraction: rank as f64 / n as f64,
                cumulative_profit,
                cumulative_average_profit,
                profit_lift,
            });
        }

        let best = curve[best_rank];
        debug!(
            rank = best.rank,
            record = best.record_index,
            "Cumulative profit peak located"
        );
        info!(
            records = n,
            best_fraction = format!("{:.4}", best.cumulative_fraction),
            best_cutoff = format!("{:.4}", best.success_probability),
            best_cumulative_profit = format!("${:.2}", best.cumulative_profit),
            baseline_avg = format!("${:.2}", baseline),
            "Allocation curve built"
        );

        Ok(AllocationReport {
            best_fraction: best.cumulative_fraction,
            best_cutoff: best.success_probability,
            best_cumulative_profit: best.cumulative_profit,
            baseline_average_profit: baseline,
            curve,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;
    use rust_decimal_macros::dec;

    fn make_records() -> Vec<LoanRecord> {
        vec![
            LoanRecord::new(Outcome::PaidInFull, 0.1, dec!(1000)),
            LoanRecord::new(Outcome::Default, 0.6, dec!(2000)),
            LoanRecord::new(Outcome::PaidInFull, 0.3, dec!(500)),
        ]
    }

    #[test]
    fn test_risk_order_least_risky_first() {
        assert_eq!(AllocationRanker::risk_order(&make_records()), vec![0, 2, 1]);
    }

    #[test]
    fn test_risk_order_ties_keep_input_order() {
        let records = vec![
            LoanRecord::new(Outcome::Default, 0.4, dec!(10)),
            LoanRecord::new(Outcome::PaidInFull, 0.2, dec!(10)),
            LoanRecord::new(Outcome::PaidInFull, 0.4, dec!(10)),
            LoanRecord::new(Outcome::Default, 0.2, dec!(10)),
        ];
        assert_eq!(AllocationRanker::risk_order(&records), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_rank_reference_scenario() {
        let report = AllocationRanker::default().rank(&make_records()).unwrap();
        let profits: Vec<Decimal> = report.curve.iter().map(|p| p.cumulative_profit).collect();
        assert_eq!(profits, vec![dec!(50), dec!(75), dec!(-425)]);
        assert!((report.best_fraction - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.best_cutoff - 0.7).abs() < 1e-12);
        assert_eq!(report.best_cumulative_profit, dec!(75));
        assert_eq!(report.funded_count(), 2);
    }

    #[test]
    fn test_last_point_covers_everything() {
        let report = AllocationRanker::default().rank(&make_records()).unwrap();
        let last = report.curve.last().unwrap();
        assert_eq!(last.cumulative_fraction, 1.0);
        assert_eq!(last.rank, 3);
        // 50 - 500 + 25
        assert_eq!(last.cumulative_profit, dec!(-425));
        assert!((last.profit_lift - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_and_lift() {
        let records = vec![
            LoanRecord::new(Outcome::PaidInFull, 0.1, dec!(1000)),
            LoanRecord::new(Outcome::PaidInFull, 0.2, dec!(1000)),
            LoanRecord::new(Outcome::Default, 0.9, dec!(100)),
            LoanRecord::new(Outcome::PaidInFull, 0.3, dec!(600)),
        ];
        // Funded profits in order: 50, 50, 30, -25 → total 105, baseline 26.25
        let report = AllocationRanker::default().rank(&records).unwrap();
        assert_eq!(report.baseline_average_profit, dec!(26.25));
        let second = report.curve[1];
        assert_eq!(second.cumulative_average_profit, dec!(50));
        assert!((second.profit_lift - 50.0 / 26.25).abs() < 1e-9);
        assert_eq!(report.best_cumulative_profit, dec!(130));
        assert_eq!(report.best_fraction, 0.75);
    }

    #[test]
    fn test_peak_ties_resolve_to_first_rank() {
        let records = vec![
            LoanRecord::new(Outcome::PaidInFull, 0.1, dec!(100)),
            LoanRecord::new(Outcome::PaidInFull, 0.2, Decimal::ZERO),
            LoanRecord::new(Outcome::Default, 0.3, dec!(100)),
        ];
        let report = AllocationRanker::default().rank(&records).unwrap();
        assert_eq!(report.best_cumulative_profit, dec!(5));
        assert!((report.best_fraction - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_is_insufficient() {
        let err = AllocationRanker::default().rank(&[]).unwrap_err();
        assert!(matches!(err, CreditError::InsufficientData { .. }));
    }

    #[test]
    fn test_zero_baseline_is_reported() {
        // +0.05 × 5000 and -0.25 × 1000 cancel out.
        let records = vec![
            LoanRecord::new(Outcome::PaidInFull, 0.1, dec!(5000)),
            LoanRecord::new(Outcome::Default, 0.5, dec!(1000)),
        ];
        let err = AllocationRanker::default().rank(&records).unwrap_err();
        assert_eq!(err.violation(), Some(&InputViolation::ZeroBaseline));
    }

    #[test]
    fn test_missing_amount_reports_record() {
        let mut records = make_records();
        records[2].exposure_amount = None;
        let err = AllocationRanker::default().rank(&records).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: exposure amount missing for record #2");
    }

    #[test]
    fn test_lift_overflow_is_an_error() {
        // Funded profits +5e25, -5e25, +3e-28: baseline 1e-28.
        let records = vec![
            LoanRecord::new(Outcome::PaidInFull, 0.1, Decimal::from_scientific("1e27").unwrap()),
            LoanRecord::new(Outcome::Default, 0.2, Decimal::from_scientific("2e26").unwrap()),
            LoanRecord::new(Outcome::PaidInFull, 0.3, Decimal::from_scientific("6e-27").unwrap()),
        ];
        let err = AllocationRanker::default().rank(&records).unwrap_err();
        assert_eq!(
            err.violation(),
            Some(&InputViolation::ProfitOverflow { index: 0 })
        );
    }

    #[test]
    fn test_rank_is_reproducible() {
        let records = make_records();
        let ranker = AllocationRanker::default();
        assert_eq!(ranker.rank(&records).unwrap(), ranker.rank(&records).unwrap());
    }
}
