//! Row and report types for the reconciliation engine
//!
//! Batch input arrives as already-tokenized string rows; the container
//! format (CSV, JSON, ...) is the caller's concern. Outputs serialize with
//! the wire field names of the external reconciliation report.

use chrono::NaiveDate;
use recon_core::{
    AccountId, Currency, IssueFlag, SettlementId, SettlementRecord, SettlementStatus,
    SettlementType, Transaction,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One raw settlement row from the external report, untyped
///
/// All fields are the tokenized string values as reported; validation and
/// parsing happen inside the ingestion pipeline so that a bad field becomes
/// a per-row error instead of a batch failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSettlementRow {
    /// Settlement identifier (required, dedup key)
    pub settlement_id: String,

    /// Settlement date (required)
    pub settlement_date: String,

    /// Settlement amount (required, positive decimal)
    pub settlement_amount: String,

    /// DEBIT or CREDIT (required, case-insensitive)
    pub settlement_type: String,

    /// Settlement currency (required)
    pub currency: String,

    /// Transaction date used for matching (required)
    pub transaction_date: String,

    /// Merchant name used for matching (required)
    pub merchant_name: String,

    /// Account identifier used for matching (required)
    pub account_id: String,

    /// Lifecycle correlation key for primary matching (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_id: Option<String>,
}

/// A raw row after validation and parsing, ready for matching
#[derive(Debug, Clone)]
pub struct ParsedRow {
    /// Settlement identifier
    pub settlement_id: SettlementId,

    /// Lifecycle correlation key, if reported
    pub lifecycle_id: Option<String>,

    /// Account identifier
    pub account_id: AccountId,

    /// Merchant name
    pub merchant_name: String,

    /// Transaction date
    pub transaction_date: NaiveDate,

    /// Settlement date
    pub settlement_date: NaiveDate,

    /// Settlement amount (positive, not yet rounded)
    pub amount: Decimal,

    /// Debit or credit
    pub settlement_type: SettlementType,

    /// Settlement currency (uppercased)
    pub currency: Currency,
}

/// A row that matched no eligible transaction
///
/// Not an error; surfaced to the caller with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnmatchedRow {
    /// The offending raw row
    pub row: RawSettlementRow,

    /// Why no transaction was linked
    pub reason: String,
}

/// A row-level error (validation failure, currency mismatch, failed insert)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowError {
    /// The offending raw row
    pub row: RawSettlementRow,

    /// Field the error applies to, when attributable to one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Failure reason
    pub error: String,
}

impl RowError {
    /// Build a row error, optionally pinned to a field
    pub fn new(row: &RawSettlementRow, field: Option<&str>, error: impl Into<String>) -> Self {
        Self {
            row: row.clone(),
            field: field.map(str::to_string),
            error: error.into(),
        }
    }
}

/// Result of one reconciliation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReport {
    /// Run identifier
    pub run_id: Uuid,

    /// Rows seen in the batch
    pub processed_rows: usize,

    /// Settlement records persisted
    pub inserted_settlements: usize,

    /// Rows linked to a transaction
    pub matched_rows: usize,

    /// Rows skipped because their settlement id was already in the ledger
    pub already_existing: usize,

    /// Rows that found no eligible transaction, with reasons
    pub unmatched_rows: Vec<UnmatchedRow>,

    /// Row-level errors
    pub errors: Vec<RowError>,

    /// Distinct transactions whose aggregates were refreshed
    pub updated_transactions: usize,

    /// Non-fatal recomputation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recalculation_errors: Option<Vec<String>>,

    /// Fleet-wide summary computed after the run
    pub dashboard: DashboardSummary,
}

/// Fleet-wide reconciliation health summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Total transactions on file
    pub total_transactions: u64,

    /// Total settlement records in the ledger
    pub total_settlements: u64,

    /// Transaction counts by re-derived settlement status
    pub breakdown_by_status: BTreeMap<SettlementStatus, u64>,

    /// Transactions flagged CRITICAL
    pub critical_issues: u64,

    /// Transactions flagged WARNING
    pub warning_issues: u64,

    /// Sum of max(0, declared - net) across transactions, 2 decimal places
    pub total_outstanding_amount: Decimal,

    /// Mean days between transaction date and last settlement date,
    /// over transactions with a settlement (0 if none)
    pub avg_days_to_settle: f64,

    /// Settled transaction share of all transactions (0 if no transactions)
    pub settlement_rate: f64,
}

/// A transaction enriched with read-time derived fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionView {
    /// The persisted transaction row
    #[serde(flatten)]
    pub transaction: Transaction,

    /// Issue flag re-derived from live settlement history
    pub issue_flag: IssueFlag,

    /// Net settled amount re-derived from live settlement history
    pub net_settled: Decimal,
}

/// A transaction with its full settlement history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetail {
    /// The persisted transaction row
    pub transaction: Transaction,

    /// Settlement records, ordered by settlement date ascending
    pub settlements: Vec<SettlementRecord>,
}
