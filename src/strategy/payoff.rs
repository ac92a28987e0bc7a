//! Payoff table and profit evaluation.
//!
//! Two distinct profit notions live here and are deliberately kept apart:
//!
//! - **classification profit** prices every (decision, outcome) cell,
//!   including the opportunity cost of denying a loan that would have been
//!   repaid. Used by the threshold optimizer.
//! - **funded profit** is the realized profit of a loan *if it is funded*.
//!   Denial is never priced. Used by the capital allocation curve.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{CreditError, Decision, InputViolation, LoanRecord, Outcome};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-unit payoff rates applied to a loan's exposure amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoffTable {
    /// Margin earned on a funded loan that is repaid.
    pub fund_paid_rate: Decimal,
    /// Charge-off severity on a funded loan that defaults.
    pub fund_default_rate: Decimal,
    /// Forgone margin on a denied loan that would have been repaid.
    pub deny_paid_rate: Decimal,
}

impl Default for PayoffTable {
    fn default() -> Self {
        Self {
            fund_paid_rate: dec!(0.05),    // +5% lender margin
            fund_default_rate: dec!(0.25), // -25% charge-off loss
            deny_paid_rate: dec!(0.05),    // -5% opportunity cost
        }
    }
}

impl PayoffTable {
    /// Contribution of one record under a fund/deny decision.
    pub fn classification_profit(&self, decision: Decision, outcome: Outcome, amount: Decimal) -> Decimal {
        match (decision, outcome) {
            (Decision::Fund, Outcome::PaidInFull) => self.fund_paid_rate * amount,
            (Decision::Fund, Outcome::Default) => -(self.fund_default_rate * amount),
            (Decision::Deny, Outcome::PaidInFull) => -(self.deny_paid_rate * amount),
            (Decision::Deny, Outcome::Default) => Decimal::ZERO,
        }
    }

    /// Realized profit of funding a loan, regardless of any policy.
    pub fn funded_profit(&self, outcome: Outcome, amount: Decimal) -> Decimal {
        self.classification_profit(Decision::Fund, outcome, amount)
    }

    fn checked_classification_profit(
        &self,
        decision: Decision,
        outcome: Outcome,
        amount: Decimal,
    ) -> Option<Decimal> {
        let rate = match (decision, outcome) {
            (Decision::Fund, Outcome::PaidInFull) => self.fund_paid_rate,
            (Decision::Fund, Outcome::Default) => -self.fund_default_rate,
            (Decision::Deny, Outcome::PaidInFull) => -self.deny_paid_rate,
            (Decision::Deny, Outcome::Default) => return Some(Decimal::ZERO),
        };
        rate.checked_mul(amount)
    }

    /// Overflow-checked funded profit, used by the allocation prefix sum.
    pub(crate) fn checked_funded_profit(&self, outcome: Outcome, amount: Decimal) -> Option<Decimal> {
        self.checked_classification_profit(Decision::Fund, outcome, amount)
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Stateless reducer computing total net profit of a decision vector.
#[derive(Debug, Clone, Default)]
pub struct ProfitEvaluator {
    payoff: PayoffTable,
}

impl ProfitEvaluator {
    pub fn new(payoff: PayoffTable) -> Self {
        Self { payoff }
    }

    pub fn payoff(&self) -> &PayoffTable {
        &self.payoff
    }

    /// Sum the payoff-table contribution of each record under `decisions`.
    ///
    /// Fails if the sequences are misaligned or any amount is missing or
    /// negative. An overflowing sum is reported as `ProfitOverflow`.
    pub fn evaluate(&self, records: &[LoanRecord], decisions: &[Decision]) -> Result<Decimal, CreditError> {
        if records.len() != decisions.len() {
            return Err(InputViolation::LengthMismatch {
                left_name: "records",
                left: records.len(),
                right_name: "decisions",
                right: decisions.len(),
            }
            .into());
        }

        let mut profit = Decimal::ZERO;
        for (index, (record, &decision)) in records.iter().zip(decisions).enumerate() {
            let amount = record.checked_amount(index)?;
            profit = self
                .payoff
                .checked_classification_profit(decision, record.outcome, amount)
                .and_then(|contribution| profit.checked_add(contribution))
                .ok_or(InputViolation::ProfitOverflow { index })?;
        }

        debug!(records = records.len(), profit = %profit, "Profit evaluated");
        Ok(profit)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
