//! Reconciliation Engine
//!
//! Reconciles externally reported settlement records against internally
//! recorded transactions: matches each record to its transaction, derives
//! per-transaction settlement status and issue flags, keeps transaction
//! aggregates consistent with the settlement ledger, and summarizes
//! fleet-wide reconciliation health.
//!
//! # Architecture
//!
//! A reconciliation run walks four phases:
//!
//! 1. **Validation**: each tokenized row parses or becomes a row error
//! 2. **Matching**: lifecycle id → exact natural key → fuzzy date window
//! 3. **Persistence**: accepted records land in the settlement ledger
//! 4. **Recomputation**: touched transactions refresh their aggregates
//!    through the single rule engine entry point
//!
//! Status/issue derivation is centralized in [`rules::evaluate`]; the
//! ingestion recompute, the listing read path, and the dashboard all call
//! it, so derived state never diverges between call sites.
//!
//! # Example
//!
//! ```no_run
//! use recon_engine::{Config, RawSettlementRow, ReconEngine};
//!
//! #[tokio::main]
//! async fn main() -> recon_engine::Result<()> {
//!     let engine = ReconEngine::in_memory(Config::default());
//!
//!     // Provision transactions via engine.transaction_store(), then:
//!     let batch: Vec<RawSettlementRow> = vec![];
//!     let report = engine.ingest(batch).await?;
//!     println!("inserted {} settlements, {} unmatched",
//!              report.inserted_settlements, report.unmatched_rows.len());
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod matcher;
pub mod recompute;
pub mod rules;
pub mod types;

// Re-exports
pub use config::{Config, IngestMode};
pub use dashboard::DashboardAggregator;
pub use engine::ReconEngine;
pub use error::{Error, Result};
pub use ingest::IngestionPipeline;
pub use matcher::{MatchOutcome, SettlementMatcher};
pub use recompute::{RecomputationEngine, RecomputeOutcome};
pub use types::{
    DashboardSummary, IngestionReport, ParsedRow, RawSettlementRow, RowError, TransactionDetail,
    TransactionView, UnmatchedRow,
};
