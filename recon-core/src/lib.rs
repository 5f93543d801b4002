//! Recon Core
//!
//! Data model and storage seam for the settlement reconciliation engine.
//!
//! # Architecture
//!
//! - **Typed model**: Transactions and settlement records with exact
//!   decimal amounts, never floats
//! - **Store traits**: The relational store is reached only through
//!   [`TransactionStore`] and [`SettlementStore`], owned by the caller
//! - **Reference store**: [`MemoryStore`] implements both traits with
//!   deterministic iteration order
//!
//! # Invariants
//!
//! - Settlement identifiers are never reused: inserts reject duplicates
//! - A persisted settlement record is linked to exactly one transaction
//! - Transaction aggregates (status, net, last settlement date) are written
//!   only through [`TransactionStore::update_aggregates`]

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod error;
pub mod memory;
pub mod store;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use store::{SettlementStore, TransactionStore};
pub use types::{
    round_money, AccountId, Currency, IssueFlag, LifecycleStatus, SettlementId,
    SettlementRecord, SettlementStatus, SettlementType, Transaction, TransactionId,
};
