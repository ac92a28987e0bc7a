//! Profit-maximizing decision threshold search.
//!
//! Sweeps a fixed grid of candidate thresholds over `P(default)`, prices
//! each resulting decision vector with the [`ProfitEvaluator`], and picks
//! the threshold with the highest net profit. The grid is scanned in full;
//! profit is not assumed to be unimodal in the threshold.

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::payoff::{PayoffTable, ProfitEvaluator};
use crate::types::{validate_records, CreditError, DecisionPolicy, InputViolation, LoanRecord};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Candidate thresholds `i / resolution` for `i in 0..steps`.
///
/// The default (`steps = 100`, `resolution = 100`) yields
/// `0.00, 0.01, …, 0.99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdGrid {
    pub steps: u32,
    pub resolution: u32,
}

impl Default for ThresholdGrid {
    fn default() -> Self {
        Self {
            steps: 100,
            resolution: 100,
        }
    }
}

impl ThresholdGrid {
    /// Grid points in ascending order. Points above 1.0 are dropped.
    pub fn thresholds(&self) -> Result<Vec<f64>, CreditError> {
        if self.steps == 0 || self.resolution == 0 {
            return Err(InputViolation::EmptyGrid {
                steps: self.steps,
                resolution: self.resolution,
            }
            .into());
        }
        // Division rather than accumulation keeps 0.3 == 30 / 100.
        Ok((0..self.steps)
            .map(|i| f64::from(i) / f64::from(self.resolution))
            .filter(|t| *t <= 1.0)
            .collect())
    }
}

/// Threshold optimizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    #[serde(flatten)]
    pub grid: ThresholdGrid,
    /// Evaluate grid points on the rayon pool.
    pub parallel: bool,
    /// Classifier's default cut, reported alongside the optimum.
    pub reference_threshold: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            grid: ThresholdGrid::default(),
            parallel: true,
            reference_threshold: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Net profit at one scanned threshold. `None` if it could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitReport {
    pub threshold: f64,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub net_profit: Option<Decimal>,
}

/// Outcome of a full threshold sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdReport {
    pub best_threshold: f64,
    #[serde(with = "rust_decimal::serde::str")]
    pub best_profit: Decimal,
    /// One entry per grid point, in ascending threshold order.
    pub curve: Vec<ProfitReport>,
}

impl ThresholdReport {
    /// Number of grid points that were excluded from the search.
    pub fn excluded_count(&self) -> usize {
        self.curve.iter().filter(|p| p.net_profit.is_none()).count()
    }
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

pub struct ThresholdOptimizer {
    evaluator: ProfitEvaluator,
    config: ThresholdConfig,
}

impl ThresholdOptimizer {
    pub fn new(payoff: PayoffTable, config: ThresholdConfig) -> Self {
        Self {
            evaluator: ProfitEvaluator::new(payoff),
            config,
        }
    }

    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &ProfitEvaluator {
        &self.evaluator
    }

    /// Net profit of a single threshold policy.
    pub fn profit_at(&self, records: &[LoanRecord], threshold: f64) -> Result<Decimal, CreditError> {
        let policy = DecisionPolicy::new(threshold)?;
        self.evaluator.evaluate(records, &policy.decide_all(records))
    }

    /// Scan the grid and select the profit-maximizing threshold.
    ///
    /// Ties resolve to the smallest threshold, i.e. the policy that funds
    /// the most loans. Grid points whose profit overflowed are recorded with
    /// `net_profit = None` and skipped by the selection.
    pub fn optimize(&self, records: &[LoanRecord]) -> Result<ThresholdReport, CreditError> {
        if records.is_empty() {
            return Err(CreditError::insufficient("threshold optimization"));
        }
        validate_records(records)?;
        let thresholds = self.config.grid.thresholds()?;

        let curve: Vec<ProfitReport> = if self.config.parallel {
            thresholds
                .par_iter()
                .map(|&t| self.scan_point(records, t))
                .collect::<Result<_, _>>()?
        } else {
            thresholds
                .iter()
                .map(|&t| self.scan_point(records, t))
                .collect::<Result<_, _>>()?
        };

        let (best_threshold, best_profit) =
            select_best(&curve).ok_or(InputViolation::NoEvaluableThreshold)?;

        info!(
            records = records.len(),
            grid_points = curve.len(),
            best_threshold = format!("{best_threshold:.2}"),
            best_profit = format!("${best_profit:.2}"),
            "Threshold sweep complete"
        );

        Ok(ThresholdReport {
            best_threshold,
            best_profit,
            curve,
        })
    }

    fn scan_point(&self, records: &[LoanRecord], threshold: f64) -> Result<ProfitReport, CreditError> {
        match self.profit_at(records, threshold) {
            Ok(profit) => {
                debug!(threshold = format!("{threshold:.2}"), profit = %profit, "Threshold evaluated");
                Ok(ProfitReport {
                    threshold,
                    net_profit: Some(profit),
                })
            }
            Err(CreditError::InvalidInput(InputViolation::ProfitOverflow { index })) => {
                warn!(
                    threshold = format!("{threshold:.2}"),
                    record = index,
                    "Profit overflowed; threshold excluded from search"
                );
                Ok(ProfitReport {
                    threshold,
                    net_profit: None,
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// First maximizer over the evaluable entries of an ascending curve.
fn select_best(curve: &[ProfitReport]) -> Option<(f64, Decimal)> {
    let mut best: Option<(f64, Decimal)> = None;
    for point in curve {
        let Some(profit) = point.net_profit else {
            continue;
        };
        match best {
            Some((_, best_profit)) if profit <= best_profit => {}
            _ => best = Some((point.threshold, profit)),
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
