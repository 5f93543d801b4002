//! Core types for reconciliation
//!
//! All types are designed for:
//! - Exact arithmetic (Decimal for money)
//! - Stable wire names (SCREAMING_SNAKE_CASE enums, matching the external
//!   settlement report vocabulary)
//! - Deterministic ordering (ids are Ord, usable as BTreeMap keys)

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round a monetary amount to 2 decimal places, midpoints away from zero
///
/// Applied to persisted settlement amounts and every derived net, so all
/// aggregate arithmetic sees the rounded values.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Internal transaction identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    /// Create new transaction ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settlement identifier reported by the external processor
///
/// Globally unique; the natural key for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SettlementId(String);

impl SettlementId {
    /// Create new settlement ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SettlementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO 4217 currency code, normalized to uppercase at construction
///
/// Normalizing once makes equality checks effectively case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create new currency code (trimmed, uppercased)
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if no code is present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a reported money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementType {
    /// Money moved toward the transaction (payout)
    Debit,
    /// Money moved away (refund / clawback)
    Credit,
}

impl SettlementType {
    /// Wire name
    pub fn code(&self) -> &'static str {
        match self {
            SettlementType::Debit => "DEBIT",
            SettlementType::Credit => "CREDIT",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("DEBIT") {
            Some(SettlementType::Debit)
        } else if s.eq_ignore_ascii_case("CREDIT") {
            Some(SettlementType::Credit)
        } else {
            None
        }
    }
}

impl fmt::Display for SettlementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Lifecycle status of a transaction, owned by the upstream provisioning
/// process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    /// Live transaction, eligible for settlement
    Active,
    /// Failed upstream; settlements against it are rejected
    Failed,
    /// Declined upstream; settlements against it are rejected
    Declined,
}

impl LifecycleStatus {
    /// Wire name
    pub fn code(&self) -> &'static str {
        match self {
            LifecycleStatus::Active => "ACTIVE",
            LifecycleStatus::Failed => "FAILED",
            LifecycleStatus::Declined => "DECLINED",
        }
    }

    /// True if settlements may attach to a transaction in this state
    pub fn is_settleable(&self) -> bool {
        !matches!(self, LifecycleStatus::Failed | LifecycleStatus::Declined)
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Derived settlement status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    /// No settlement yet, or net settled is zero
    Pending,
    /// Under-settled with only debit history
    Partial,
    /// Net settled equals the declared amount
    FullySettled,
    /// Net settled exceeds the declared amount
    OverSettled,
    /// Under-settled after at least one credit
    Refunded,
    /// Reconciliation does not apply to this transaction
    NotApplicable,
}

impl SettlementStatus {
    /// Wire name
    pub fn code(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "PENDING",
            SettlementStatus::Partial => "PARTIAL",
            SettlementStatus::FullySettled => "FULLY_SETTLED",
            SettlementStatus::OverSettled => "OVER_SETTLED",
            SettlementStatus::Refunded => "REFUNDED",
            SettlementStatus::NotApplicable => "NOT_APPLICABLE",
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Operational attention level, distinct from settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueFlag {
    /// Nothing to act on
    None,
    /// Under-settled with no credit history
    Warning,
    /// Over-settled, or stale with no settlement at all
    Critical,
}

impl IssueFlag {
    /// Wire name
    pub fn code(&self) -> &'static str {
        match self {
            IssueFlag::None => "NONE",
            IssueFlag::Warning => "WARNING",
            IssueFlag::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for IssueFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// An internally recorded payment expectation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID
    pub transaction_id: TransactionId,

    /// Stable correlation key for primary matching (optional)
    pub lifecycle_id: Option<String>,

    /// Account the transaction belongs to
    pub account_id: AccountId,

    /// Merchant name as recorded internally
    pub merchant_name: String,

    /// Transaction date
    pub transaction_date: NaiveDate,

    /// Declared amount (positive)
    pub transaction_amount: Decimal,

    /// Transaction currency (may be unset upstream)
    pub currency: Option<Currency>,

    /// Lifecycle status owned by upstream provisioning
    pub status: LifecycleStatus,

    /// Derived settlement status (refreshed by recomputation)
    pub settlement_status: SettlementStatus,

    /// Derived net settled amount (refreshed by recomputation)
    pub total_settled_amount: Decimal,

    /// Most recent settlement date, if any (refreshed by recomputation)
    pub last_settlement_date: Option<NaiveDate>,
}

impl Transaction {
    /// True if settlements may attach to this transaction
    ///
    /// FAILED/DECLINED transactions and NOT_APPLICABLE reconciliation
    /// targets are rejected at match time.
    pub fn eligible_for_settlement(&self) -> bool {
        self.status.is_settleable() && self.settlement_status != SettlementStatus::NotApplicable
    }
}

/// One reported money movement, linked to a transaction at match time
///
/// Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    /// Globally unique settlement ID (dedup key)
    pub settlement_id: SettlementId,

    /// Transaction this record settles
    pub transaction_id: TransactionId,

    /// Lifecycle ID copied from the matched transaction
    pub lifecycle_id: Option<String>,

    /// Settlement date
    pub settlement_date: NaiveDate,

    /// Settlement amount (positive, 2 decimal places)
    pub settlement_amount: Decimal,

    /// Debit or credit
    pub settlement_type: SettlementType,

    /// Settlement currency
    pub currency: Currency,
}

impl SettlementRecord {
    /// Amount signed by direction: debits add to net settled, credits
    /// subtract
    pub fn signed_amount(&self) -> Decimal {
        match self.settlement_type {
            SettlementType::Debit => self.settlement_amount,
            SettlementType::Credit => -self.settlement_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_midpoint_away_from_zero() {
        assert_eq!(round_money(Decimal::new(33335, 3)), Decimal::new(3334, 2));
        assert_eq!(round_money(Decimal::new(-33335, 3)), Decimal::new(-3334, 2));
        assert_eq!(round_money(Decimal::new(10000, 2)), Decimal::new(10000, 2));
    }

    #[test]
    fn test_currency_normalization() {
        assert_eq!(Currency::new(" usd ").as_str(), "USD");
        assert_eq!(Currency::new("EUR"), Currency::new("eur"));
        assert!(Currency::new("").is_empty());
    }

    #[test]
    fn test_settlement_type_parse() {
        assert_eq!(SettlementType::parse("debit"), Some(SettlementType::Debit));
        assert_eq!(SettlementType::parse(" CREDIT "), Some(SettlementType::Credit));
        assert_eq!(SettlementType::parse("TRANSFER"), None);
    }

    #[test]
    fn test_signed_amount() {
        let mut record = SettlementRecord {
            settlement_id: SettlementId::new("S-1"),
            transaction_id: TransactionId::new("TXN-1"),
            lifecycle_id: None,
            settlement_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            settlement_amount: Decimal::new(4000, 2),
            settlement_type: SettlementType::Debit,
            currency: Currency::new("USD"),
        };
        assert_eq!(record.signed_amount(), Decimal::new(4000, 2));

        record.settlement_type = SettlementType::Credit;
        assert_eq!(record.signed_amount(), Decimal::new(-4000, 2));
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&SettlementStatus::FullySettled).unwrap();
        assert_eq!(json, "\"FULLY_SETTLED\"");

        let json = serde_json::to_string(&IssueFlag::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");

        let parsed: SettlementType = serde_json::from_str("\"DEBIT\"").unwrap();
        assert_eq!(parsed, SettlementType::Debit);
    }

    #[test]
    fn test_eligibility() {
        let txn = Transaction {
            transaction_id: TransactionId::new("TXN-1"),
            lifecycle_id: None,
            account_id: AccountId::new("ACC-1"),
            merchant_name: "Acme".to_string(),
            transaction_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            transaction_amount: Decimal::new(10000, 2),
            currency: Some(Currency::new("USD")),
            status: LifecycleStatus::Active,
            settlement_status: SettlementStatus::Pending,
            total_settled_amount: Decimal::ZERO,
            last_settlement_date: None,
        };
        assert!(txn.eligible_for_settlement());

        let failed = Transaction {
            status: LifecycleStatus::Failed,
            ..txn.clone()
        };
        assert!(!failed.eligible_for_settlement());

        let na = Transaction {
            settlement_status: SettlementStatus::NotApplicable,
            ..txn
        };
        assert!(!na.eligible_for_settlement());
    }
}
