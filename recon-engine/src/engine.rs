//! Main reconciliation engine facade
//!
//! Composes the ingestion pipeline, recomputation, dashboard, and the
//! read-path queries over caller-owned stores. Stores are injected per
//! engine instance; there is no process-wide storage state.

use crate::config::Config;
use crate::dashboard::DashboardAggregator;
use crate::error::Result;
use crate::ingest::IngestionPipeline;
use crate::rules;
use crate::types::{
    DashboardSummary, IngestionReport, RawSettlementRow, TransactionDetail, TransactionView,
};
use chrono::Utc;
use recon_core::{
    MemoryStore, SettlementStatus, SettlementStore, TransactionId, TransactionStore,
};
use std::fmt;
use std::sync::Arc;

/// Reconciliation engine
#[derive(Clone)]
pub struct ReconEngine {
    transactions: Arc<dyn TransactionStore>,
    settlements: Arc<dyn SettlementStore>,
    config: Config,
}

impl fmt::Debug for ReconEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReconEngine {
    /// Create an engine over caller-owned stores
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        settlements: Arc<dyn SettlementStore>,
        config: Config,
    ) -> Self {
        Self {
            transactions,
            settlements,
            config,
        }
    }

    /// Create an engine backed by a fresh in-memory store
    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store, config)
    }

    /// Handle to the transaction store (provisioning seam for callers)
    pub fn transaction_store(&self) -> Arc<dyn TransactionStore> {
        self.transactions.clone()
    }

    /// Handle to the settlement store
    pub fn settlement_store(&self) -> Arc<dyn SettlementStore> {
        self.settlements.clone()
    }

    /// Ingest one settlement batch and reconcile
    pub async fn ingest(&self, batch: Vec<RawSettlementRow>) -> Result<IngestionReport> {
        IngestionPipeline::new(
            self.transactions.clone(),
            self.settlements.clone(),
            self.config.clone(),
        )
        .ingest(batch)
        .await
    }

    /// All transactions, optionally filtered by persisted settlement status
    ///
    /// Issue flag and net are re-derived from live settlement history
    /// through the rule engine, tolerating stale persisted aggregates.
    pub fn list_transactions(
        &self,
        status: Option<SettlementStatus>,
    ) -> Result<Vec<TransactionView>> {
        let today = Utc::now().date_naive();
        let mut views = Vec::new();

        for txn in self.transactions.list(status)? {
            let records = self.settlements.list_for_transaction(&txn.transaction_id)?;
            let agg = rules::aggregate(&records);
            let derived = rules::evaluate(&agg.rule_input(
                txn.transaction_amount,
                txn.transaction_date,
                today,
            ));

            views.push(TransactionView {
                transaction: txn,
                issue_flag: derived.issue,
                net_settled: agg.net_settled,
            });
        }

        Ok(views)
    }

    /// One transaction with its settlement history, date ascending
    pub fn transaction_detail(&self, id: &TransactionId) -> Result<Option<TransactionDetail>> {
        let Some(transaction) = self.transactions.get(id)? else {
            return Ok(None);
        };
        let settlements = self.settlements.list_for_transaction(id)?;
        Ok(Some(TransactionDetail {
            transaction,
            settlements,
        }))
    }

    /// Fleet-wide reconciliation health summary, computed on demand
    pub fn dashboard_summary(&self) -> Result<DashboardSummary> {
        DashboardAggregator::new(self.transactions.clone(), self.settlements.clone())
            .summarize(Utc::now().date_naive())
    }
}
