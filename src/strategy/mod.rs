//! Strategy engine: profit evaluation, threshold search, and capital
//! allocation ranking.

pub mod allocation;
pub mod payoff;
pub mod threshold;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::data::ScoredRecordProvider;
use crate::evaluation::calibration::{Calibrator, ScoreDiagnostics};
use crate::evaluation::classification::{summarize, ClassificationSummary};
use crate::types::{CreditError, LoanRecord};
use allocation::{AllocationRanker, AllocationReport};
use payoff::PayoffTable;
use threshold::{ThresholdConfig, ThresholdOptimizer, ThresholdReport};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything the reporting layer needs from one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,
    pub payoff: PayoffTable,
    pub threshold: ThresholdReport,
    /// Performance at the classifier's default cut.
    pub reference: ClassificationSummary,
    /// Performance at the profit-maximizing threshold.
    pub optimal: ClassificationSummary,
    pub allocation: AllocationReport,
    pub diagnostics: ScoreDiagnostics,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Pipelines threshold search → classification summaries → allocation
/// ranking → score diagnostics over one immutable record set.
///
/// Holds configuration only; every call is independent.
pub struct CreditStrategy {
    optimizer: ThresholdOptimizer,
    ranker: AllocationRanker,
    calibrator: Calibrator,
}

impl CreditStrategy {
    pub fn new(payoff: PayoffTable, threshold: ThresholdConfig, calibration_bins: usize) -> Self {
        Self {
            optimizer: ThresholdOptimizer::new(payoff, threshold),
            ranker: AllocationRanker::new(payoff),
            calibrator: Calibrator::new(calibration_bins),
        }
    }

    pub fn optimizer(&self) -> &ThresholdOptimizer {
        &self.optimizer
    }

    pub fn ranker(&self) -> &AllocationRanker {
        &self.ranker
    }

    /// Run the full pipeline. Fails fast; no partial report is produced.
    pub fn run(&self, records: &[LoanRecord]) -> Result<PolicyReport, CreditError> {
        let threshold = self.optimizer.optimize(records)?;

        let evaluator = self.optimizer.evaluator();
        let reference_threshold = self.optimizer.config().reference_threshold;
        let reference = summarize(records, reference_threshold, evaluator)?;
        let optimal = summarize(records, threshold.best_threshold, evaluator)?;

        let allocation = self.ranker.rank(records)?;
        let diagnostics = self.calibrator.report(records);

        if diagnostics.roc_auc.is_none() {
            warn!("Only one outcome class present; ROC AUC undefined");
        }

        info!(
            records = records.len(),
            reference_threshold = format!("{reference_threshold:.2}"),
            reference_profit = format!("${:.2}", reference.net_profit),
            best_threshold = format!("{:.2}", threshold.best_threshold),
            best_profit = format!("${:.2}", threshold.best_profit),
            rate_of_return = format!("{:.2}%", optimal.rate_of_return_pct),
            best_fraction = format!("{:.2}", allocation.best_fraction),
            best_cutoff = format!("{:.4}", allocation.best_cutoff),
            "Credit policy run complete"
        );

        Ok(PolicyReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            record_count: records.len(),
            payoff: *self.optimizer.evaluator().payoff(),
            threshold,
            reference,
            optimal,
            allocation,
            diagnostics,
        })
    }

    /// Load records from `provider` and run the pipeline.
    pub fn run_from(&self, provider: &dyn ScoredRecordProvider) -> anyhow::Result<PolicyReport> {
        let source = provider.source_name();
        let records = provider
            .load_records()
            .with_context(|| format!("Failed to load scored records from {source}"))?;
        info!(source = %source, records = records.len(), "Scored records received");

        self.run(&records)
            .with_context(|| format!("Credit policy run failed for {source}"))
    }
}

impl Default for CreditStrategy {
    fn default() -> Self {
        Self::new(PayoffTable::default(), ThresholdConfig::default(), 10)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
