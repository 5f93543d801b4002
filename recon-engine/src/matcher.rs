//! Settlement-to-transaction matching
//!
//! Layered lookup, first success wins:
//!
//! 1. Lifecycle identifier, exact
//! 2. (account, merchant, transaction date), exact
//! 3. Fuzzy: same (account, merchant), date within a calendar-day window,
//!    closest date wins; ties go to the lowest transaction id
//!
//! A matched transaction still has to pass the eligibility gate
//! (FAILED/DECLINED lifecycle and NOT_APPLICABLE reconciliation targets
//! are rejected with a reason) and the currency gate (a disagreeing
//! currency is a hard row error, not an unmatched row).

use crate::error::{Error, Result};
use crate::types::ParsedRow;
use recon_core::{Transaction, TransactionStore};
use std::fmt;

/// Outcome of matching one settlement record
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// Record belongs to this transaction
    Matched(Transaction),

    /// No eligible transaction found; a normal outcome, not an error
    Unmatched {
        /// Why no transaction was linked
        reason: String,
    },
}

/// Settlement matcher over a transaction repository
pub struct SettlementMatcher<'a> {
    transactions: &'a dyn TransactionStore,
    fuzzy_window_days: i64,
}

impl fmt::Debug for SettlementMatcher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettlementMatcher")
            .field("fuzzy_window_days", &self.fuzzy_window_days)
            .finish_non_exhaustive()
    }
}

impl<'a> SettlementMatcher<'a> {
    /// Create a matcher over the given repository
    pub fn new(transactions: &'a dyn TransactionStore, fuzzy_window_days: i64) -> Self {
        Self {
            transactions,
            fuzzy_window_days,
        }
    }

    /// Match one parsed row to a transaction
    pub fn match_row(&self, row: &ParsedRow) -> Result<MatchOutcome> {
        let Some(txn) = self.locate(row)? else {
            return Ok(MatchOutcome::Unmatched {
                reason: "no matching transaction".to_string(),
            });
        };

        if !txn.eligible_for_settlement() {
            tracing::debug!(
                settlement_id = %row.settlement_id,
                transaction_id = %txn.transaction_id,
                "Matched transaction not eligible"
            );
            return Ok(MatchOutcome::Unmatched {
                reason: "transaction not eligible".to_string(),
            });
        }

        if let Some(currency) = &txn.currency {
            if !currency.is_empty() && *currency != row.currency {
                return Err(Error::CurrencyMismatch {
                    transaction: currency.to_string(),
                    record: row.currency.to_string(),
                });
            }
        }

        Ok(MatchOutcome::Matched(txn))
    }

    /// Run the layered lookup without gates
    fn locate(&self, row: &ParsedRow) -> Result<Option<Transaction>> {
        // Lifecycle ids are unique upstream; a present-but-unknown id still
        // falls through to the natural-key strategies
        if let Some(lifecycle_id) = &row.lifecycle_id {
            if let Some(txn) = self.transactions.find_by_lifecycle_id(lifecycle_id)? {
                return Ok(Some(txn));
            }
        }

        if let Some(txn) = self.transactions.find_exact(
            &row.account_id,
            &row.merchant_name,
            row.transaction_date,
        )? {
            return Ok(Some(txn));
        }

        let mut candidates = self.transactions.find_window(
            &row.account_id,
            &row.merchant_name,
            row.transaction_date,
            self.fuzzy_window_days,
        )?;

        // Closest date first; equidistant candidates resolve to the lowest
        // transaction id
        candidates.sort_by(|a, b| {
            let da = (a.transaction_date - row.transaction_date).num_days().abs();
            let db = (b.transaction_date - row.transaction_date).num_days().abs();
            da.cmp(&db)
                .then_with(|| a.transaction_id.cmp(&b.transaction_id))
        });

        Ok(candidates.into_iter().next())
    }
}
