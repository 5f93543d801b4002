//! Fleet-wide reconciliation health summary
//!
//! Recomputed in full on every request; no cached staleness window. Status
//! and issue are re-derived from live settlement history through the rule
//! engine rather than trusting persisted aggregates, so the summary stays
//! correct even if aggregates have drifted.

use crate::error::Result;
use crate::rules;
use crate::types::DashboardSummary;
use chrono::NaiveDate;
use recon_core::{round_money, IssueFlag, SettlementStore, TransactionStore};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Dashboard aggregator
#[derive(Clone)]
pub struct DashboardAggregator {
    transactions: Arc<dyn TransactionStore>,
    settlements: Arc<dyn SettlementStore>,
}

impl fmt::Debug for DashboardAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardAggregator").finish_non_exhaustive()
    }
}

impl DashboardAggregator {
    /// Create an aggregator over the given stores
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        settlements: Arc<dyn SettlementStore>,
    ) -> Self {
        Self {
            transactions,
            settlements,
        }
    }

    /// Compute the fleet-wide summary as of `today`
    pub fn summarize(&self, today: NaiveDate) -> Result<DashboardSummary> {
        let txns = self.transactions.list(None)?;
        let total_transactions = txns.len() as u64;
        let total_settlements = self.settlements.count()?;

        let mut breakdown_by_status: BTreeMap<_, u64> = BTreeMap::new();
        let mut critical_issues = 0u64;
        let mut warning_issues = 0u64;
        let mut outstanding = Decimal::ZERO;
        let mut days_to_settle: Vec<i64> = Vec::new();
        let mut settled_count = 0u64;

        for txn in &txns {
            let records = self.settlements.list_for_transaction(&txn.transaction_id)?;
            let agg = rules::aggregate(&records);
            let derived = rules::evaluate(&agg.rule_input(
                txn.transaction_amount,
                txn.transaction_date,
                today,
            ));

            *breakdown_by_status.entry(derived.status).or_insert(0) += 1;
            match derived.issue {
                IssueFlag::Critical => critical_issues += 1,
                IssueFlag::Warning => warning_issues += 1,
                IssueFlag::None => {}
            }

            outstanding += (txn.transaction_amount - agg.net_settled).max(Decimal::ZERO);
            if let Some(last) = agg.last_settlement_date {
                days_to_settle.push((last - txn.transaction_date).num_days());
                settled_count += 1;
            }
        }

        let avg_days_to_settle = if days_to_settle.is_empty() {
            0.0
        } else {
            days_to_settle.iter().sum::<i64>() as f64 / days_to_settle.len() as f64
        };
        let settlement_rate = if total_transactions == 0 {
            0.0
        } else {
            settled_count as f64 / total_transactions as f64
        };

        Ok(DashboardSummary {
            total_transactions,
            total_settlements,
            breakdown_by_status,
            critical_issues,
            warning_issues,
            total_outstanding_amount: round_money(outstanding),
            avg_days_to_settle: round_ratio(avg_days_to_settle),
            settlement_rate: round_ratio(settlement_rate),
        })
    }
}

/// Round a derived ratio/average to 2 decimal places
fn round_ratio(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
