//! Store traits for the relational seam
//!
//! The engine never talks to a database directly. Callers own the store
//! lifecycle and inject these capabilities per run, which keeps the core
//! free of process-wide storage state.

use crate::error::Result;
use crate::types::{
    AccountId, SettlementId, SettlementRecord, SettlementStatus, Transaction, TransactionId,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Read/write access to internally recorded transactions
pub trait TransactionStore: Send + Sync {
    /// Fetch a transaction by id
    fn get(&self, id: &TransactionId) -> Result<Option<Transaction>>;

    /// Look up by lifecycle correlation key
    ///
    /// Lifecycle ids are assumed unique upstream; if the assumption is
    /// violated the store returns the first match in id order.
    fn find_by_lifecycle_id(&self, lifecycle_id: &str) -> Result<Option<Transaction>>;

    /// Exact (account, merchant, transaction date) lookup
    fn find_exact(
        &self,
        account_id: &AccountId,
        merchant_name: &str,
        date: NaiveDate,
    ) -> Result<Option<Transaction>>;

    /// Candidates with the same (account, merchant) whose date falls within
    /// `window_days` calendar days of `around`, ordered by transaction id
    fn find_window(
        &self,
        account_id: &AccountId,
        merchant_name: &str,
        around: NaiveDate,
        window_days: i64,
    ) -> Result<Vec<Transaction>>;

    /// All transactions, optionally filtered by persisted settlement status
    fn list(&self, status: Option<SettlementStatus>) -> Result<Vec<Transaction>>;

    /// Create or replace a transaction (the provisioning seam)
    fn upsert(&self, txn: Transaction) -> Result<()>;

    /// Persist derived aggregates onto the transaction row
    ///
    /// The only mutation path for settlement_status, total_settled_amount
    /// and last_settlement_date.
    fn update_aggregates(
        &self,
        id: &TransactionId,
        status: SettlementStatus,
        total_settled: Decimal,
        last_settlement_date: Option<NaiveDate>,
    ) -> Result<()>;

    /// Total transaction count
    fn count(&self) -> Result<u64>;
}

/// Read/write access to the settlement ledger
pub trait SettlementStore: Send + Sync {
    /// True if a record with this settlement id is already persisted
    fn exists(&self, id: &SettlementId) -> Result<bool>;

    /// Insert a new record; rejects duplicate settlement ids
    fn insert(&self, record: SettlementRecord) -> Result<()>;

    /// Remove every record (replace-mode ingestion)
    fn clear(&self) -> Result<()>;

    /// All records for one transaction, ordered by settlement date ascending
    fn list_for_transaction(&self, id: &TransactionId) -> Result<Vec<SettlementRecord>>;

    /// Copy of the full ledger, taken before a run so a fatal failure can
    /// roll the ledger back
    fn snapshot(&self) -> Result<Vec<SettlementRecord>>;

    /// Replace the ledger contents with a previously taken snapshot
    fn restore(&self, records: Vec<SettlementRecord>) -> Result<()>;

    /// Total record count
    fn count(&self) -> Result<u64>;
}
