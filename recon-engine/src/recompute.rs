//! Transaction aggregate recomputation
//!
//! Reloads a transaction's full settlement history, re-derives status and
//! aggregates through the rule engine, and persists them back onto the
//! transaction row. Idempotent: with no intervening settlement change, a
//! second run persists identical state.

use crate::error::Result;
use crate::rules;
use chrono::NaiveDate;
use recon_core::{
    IssueFlag, SettlementStatus, SettlementStore, TransactionId, TransactionStore,
};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

/// Result of one recomputation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeOutcome {
    /// Derived settlement status
    pub status: SettlementStatus,

    /// Derived issue flag
    pub issue: IssueFlag,

    /// Net settled amount, rounded to 2 decimal places
    pub net_settled: Decimal,

    /// Latest settlement date, if any
    pub last_settlement_date: Option<NaiveDate>,
}

/// Recomputation engine
#[derive(Clone)]
pub struct RecomputationEngine {
    transactions: Arc<dyn TransactionStore>,
    settlements: Arc<dyn SettlementStore>,
}

impl fmt::Debug for RecomputationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecomputationEngine").finish_non_exhaustive()
    }
}

impl RecomputationEngine {
    /// Create a recomputation engine over the given stores
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        settlements: Arc<dyn SettlementStore>,
    ) -> Self {
        Self {
            transactions,
            settlements,
        }
    }

    /// Refresh one transaction's persisted aggregates
    ///
    /// Returns `None` if the transaction does not exist (a no-op, not an
    /// error).
    pub fn recompute(
        &self,
        id: &TransactionId,
        today: NaiveDate,
    ) -> Result<Option<RecomputeOutcome>> {
        let Some(txn) = self.transactions.get(id)? else {
            return Ok(None);
        };

        let records = self.settlements.list_for_transaction(id)?;
        let agg = rules::aggregate(&records);
        let derived = rules::evaluate(&agg.rule_input(
            txn.transaction_amount,
            txn.transaction_date,
            today,
        ));

        self.transactions.update_aggregates(
            id,
            derived.status,
            agg.net_settled,
            agg.last_settlement_date,
        )?;

        Ok(Some(RecomputeOutcome {
            status: derived.status,
            issue: derived.issue,
            net_settled: agg.net_settled,
            last_settlement_date: agg.last_settlement_date,
        }))
    }
}
