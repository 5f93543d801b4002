//! Error types for the reconciliation engine

use thiserror::Error;

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciliation errors
#[derive(Error, Debug)]
pub enum Error {
    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] recon_core::Error),

    /// Record currency disagrees with the matched transaction's currency
    ///
    /// A hard per-row validation failure, reported distinctly from an
    /// unmatched row.
    #[error("Currency mismatch: txn={transaction} record={record}")]
    CurrencyMismatch {
        /// Currency recorded on the transaction
        transaction: String,
        /// Currency reported on the settlement record
        record: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Reconciliation run aborted; the settlement ledger was rolled back
    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
