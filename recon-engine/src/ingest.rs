//! Reconciliation run orchestration
//!
//! One run walks an already-tokenized batch row by row: validate, dedup
//! against the ledger, match, persist. Row failures never abort the batch;
//! each row resolves to a typed outcome that the run aggregates into the
//! report. After the insert phase has fully committed, aggregates for every
//! touched transaction are recomputed concurrently.
//!
//! A fatal failure (run-scoped store operation going down) rolls the
//! settlement ledger back to its pre-run snapshot and surfaces a single
//! top-level error; transaction aggregates are untouched in that case
//! because recomputation only runs after a clean insert phase.

use crate::config::{Config, IngestMode};
use crate::dashboard::DashboardAggregator;
use crate::error::{Error, Result};
use crate::matcher::{MatchOutcome, SettlementMatcher};
use crate::recompute::RecomputationEngine;
use crate::types::{IngestionReport, ParsedRow, RawSettlementRow, RowError, UnmatchedRow};
use chrono::{DateTime, NaiveDate, Utc};
use recon_core::{
    round_money, AccountId, Currency, SettlementId, SettlementRecord, SettlementStore,
    SettlementType, TransactionId, TransactionStore,
};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Typed outcome of one row
enum RowOutcome {
    /// Persisted against this transaction
    Inserted(TransactionId),
    /// Settlement id already in the ledger
    Duplicate,
    /// No eligible transaction
    Unmatched(String),
    /// Validation, currency, or persistence failure
    Invalid(RowError),
}

/// Ingestion pipeline for reconciliation runs
#[derive(Clone)]
pub struct IngestionPipeline {
    transactions: Arc<dyn TransactionStore>,
    settlements: Arc<dyn SettlementStore>,
    config: Config,
}

impl fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IngestionPipeline {
    /// Create a pipeline over the given stores
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

    /// Run a full reconciliation over one batch
    ///
    /// On a fatal failure the settlement ledger is restored to its pre-run
    /// state before the error is returned.
    pub async fn ingest(&self, batch: Vec<RawSettlementRow>) -> Result<IngestionReport> {
        let run_id = Uuid::new_v4();
        tracing::info!(
            %run_id,
            rows = batch.len(),
            mode = ?self.config.ingest.mode,
            "Starting reconciliation run"
        );

        let backup = self.settlements.snapshot()?;

        match self.run(run_id, &batch).await {
            Ok(report) => {
                tracing::info!(
                    %run_id,
                    inserted = report.inserted_settlements,
                    unmatched = report.unmatched_rows.len(),
                    errors = report.errors.len(),
                    updated = report.updated_transactions,
                    "Reconciliation run complete"
                );
                Ok(report)
            }
            Err(err) => {
                tracing::warn!(%run_id, error = %err, "Reconciliation run failed, rolling back ledger");
                self.settlements.restore(backup)?;
                Err(err)
            }
        }
    }

    async fn run(&self, run_id: Uuid, batch: &[RawSettlementRow]) -> Result<IngestionReport> {
        if self.config.ingest.mode == IngestMode::Replace {
            self.settlements.clear()?;
        }

        let matcher = SettlementMatcher::new(
            self.transactions.as_ref(),
            self.config.matching.fuzzy_window_days,
        );

        let mut processed_rows = 0usize;
        let mut inserted_settlements = 0usize;
        let mut matched_rows = 0usize;
        let mut already_existing = 0usize;
        let mut unmatched_rows = Vec::new();
        let mut errors = Vec::new();
        let mut touched: BTreeSet<TransactionId> = BTreeSet::new();

        // Sequential on purpose: in-run duplicate detection depends on
        // insertion order
        for raw in batch {
            processed_rows += 1;
            match self.process_row(&matcher, raw) {
                RowOutcome::Inserted(txn_id) => {
                    inserted_settlements += 1;
                    matched_rows += 1;
                    touched.insert(txn_id);
                }
                RowOutcome::Duplicate => already_existing += 1,
                RowOutcome::Unmatched(reason) => unmatched_rows.push(UnmatchedRow {
                    row: raw.clone(),
                    reason,
                }),
                RowOutcome::Invalid(error) => errors.push(error),
            }
        }

        // Insert phase is fully committed here; recomputation may fan out
        let today = Utc::now().date_naive();
        let recalculation_errors = self.recompute_touched(&touched, today).await;

        let dashboard =
            DashboardAggregator::new(self.transactions.clone(), self.settlements.clone())
                .summarize(today)?;

        Ok(IngestionReport {
            run_id,
            processed_rows,
            inserted_settlements,
            matched_rows,
            already_existing,
            unmatched_rows,
            errors,
            updated_transactions: touched.len(),
            recalculation_errors: if recalculation_errors.is_empty() {
                None
            } else {
                Some(recalculation_errors)
            },
            dashboard,
        })
    }

    /// Resolve one raw row to its typed outcome; never fails the batch
    fn process_row(&self, matcher: &SettlementMatcher<'_>, raw: &RawSettlementRow) -> RowOutcome {
        // Dedup on the settlement id before the rest of the row is parsed:
        // a repeated id is already-existing even if other fields are bad
        let settlement_id = raw.settlement_id.trim();
        if settlement_id.is_empty() {
            return RowOutcome::Invalid(RowError::new(
                raw,
                Some("settlement_id"),
                "missing settlement_id",
            ));
        }
        match self.settlements.exists(&SettlementId::new(settlement_id)) {
            Ok(true) => return RowOutcome::Duplicate,
            Ok(false) => {}
            Err(e) => return RowOutcome::Invalid(RowError::new(raw, None, e.to_string())),
        }

        let parsed = match parse_row(raw) {
            Ok(parsed) => parsed,
            Err(error) => return RowOutcome::Invalid(error),
        };

        let txn = match matcher.match_row(&parsed) {
            Ok(MatchOutcome::Matched(txn)) => txn,
            Ok(MatchOutcome::Unmatched { reason }) => return RowOutcome::Unmatched(reason),
            Err(err @ Error::CurrencyMismatch { .. }) => {
                return RowOutcome::Invalid(RowError::new(raw, Some("currency"), err.to_string()))
            }
            Err(err) => return RowOutcome::Invalid(RowError::new(raw, None, err.to_string())),
        };

        let record = SettlementRecord {
            settlement_id: parsed.settlement_id.clone(),
            transaction_id: txn.transaction_id.clone(),
            lifecycle_id: txn.lifecycle_id.clone(),
            settlement_date: parsed.settlement_date,
            settlement_amount: round_money(parsed.amount),
            settlement_type: parsed.settlement_type,
            currency: parsed.currency.clone(),
        };

        match self.settlements.insert(record) {
            Ok(()) => RowOutcome::Inserted(txn.transaction_id),
            Err(e) => RowOutcome::Invalid(RowError::new(
                raw,
                None,
                format!("settlement insert failed: {e}"),
            )),
        }
    }

    /// Refresh aggregates for every touched transaction, concurrently
    ///
    /// Failures are collected as warnings; they never fail the batch.
    async fn recompute_touched(
        &self,
        touched: &BTreeSet<TransactionId>,
        today: NaiveDate,
    ) -> Vec<String> {
        let engine = RecomputationEngine::new(self.transactions.clone(), self.settlements.clone());

        let mut handles = Vec::with_capacity(touched.len());
        for id in touched {
            let engine = engine.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let result = engine.recompute(&id, today);
                (id, result)
            }));
        }

        let mut warnings = Vec::new();
        for handle in handles {
            match handle.await {
                Ok((_, Ok(_))) => {}
                Ok((id, Err(e))) => {
                    tracing::warn!(transaction_id = %id, error = %e, "Recomputation failed");
                    warnings.push(format!("Failed to recalculate transaction {id}: {e}"));
                }
                Err(e) => warnings.push(format!("Recalculation task failed: {e}")),
            }
        }
        warnings
    }
}

/// Validate and parse one raw row
fn parse_row(raw: &RawSettlementRow) -> std::result::Result<ParsedRow, RowError> {
    let settlement_id = raw.settlement_id.trim();
    if settlement_id.is_empty() {
        return Err(RowError::new(
            raw,
            Some("settlement_id"),
            "missing settlement_id",
        ));
    }

    let account_id = raw.account_id.trim();
    if account_id.is_empty() {
        return Err(RowError::new(raw, Some("account_id"), "missing account_id"));
    }

    let merchant_name = raw.merchant_name.trim();
    if merchant_name.is_empty() {
        return Err(RowError::new(
            raw,
            Some("merchant_name"),
            "missing merchant_name",
        ));
    }

    let transaction_date = parse_date(&raw.transaction_date).ok_or_else(|| {
        RowError::new(
            raw,
            Some("transaction_date"),
            format!("invalid date: {}", raw.transaction_date),
        )
    })?;
    let settlement_date = parse_date(&raw.settlement_date).ok_or_else(|| {
        RowError::new(
            raw,
            Some("settlement_date"),
            format!("invalid date: {}", raw.settlement_date),
        )
    })?;

    let amount = Decimal::from_str(raw.settlement_amount.trim()).map_err(|_| {
        RowError::new(
            raw,
            Some("settlement_amount"),
            format!("invalid settlement_amount: {}", raw.settlement_amount),
        )
    })?;
    if amount <= Decimal::ZERO {
        return Err(RowError::new(
            raw,
            Some("settlement_amount"),
            "non-positive settlement_amount",
        ));
    }

    let settlement_type = SettlementType::parse(&raw.settlement_type).ok_or_else(|| {
        RowError::new(
            raw,
            Some("settlement_type"),
            "settlement_type must be DEBIT or CREDIT",
        )
    })?;

    let currency = Currency::new(raw.currency.as_str());
    if currency.is_empty() {
        return Err(RowError::new(raw, Some("currency"), "missing currency"));
    }

    let lifecycle_id = raw
        .lifecycle_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(ParsedRow {
        settlement_id: SettlementId::new(settlement_id),
        lifecycle_id,
        account_id: AccountId::new(account_id),
        merchant_name: merchant_name.to_string(),
        transaction_date,
        settlement_date,
        amount,
        settlement_type,
        currency,
    })
}

/// Parse a reported date: ISO date, RFC 3339 timestamp, or US-style date
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
        return Some(datetime.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return Some(date);
    }
    None
}
