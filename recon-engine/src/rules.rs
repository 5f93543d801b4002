//! Status rule engine
//!
//! Pure derivation of settlement status and issue flag from a transaction's
//! settlement history shape. No I/O, no hidden state: the evaluation date
//! is an explicit input. Every call site (recomputation, the listing read
//! path, the dashboard) goes through [`evaluate`] so status and issue can
//! never diverge between them.
//!
//! # Decision table
//!
//! Status, first match wins:
//!
//! 1. no settlement, or net == 0       → PENDING
//! 2. net > amount                     → OVER_SETTLED
//! 3. |net − amount| < 1e-9            → FULLY_SETTLED
//! 4. credit seen and net < amount     → REFUNDED
//! 5. net < amount                     → PARTIAL
//! 6. fallback                         → PENDING
//!
//! Issue, CRITICAL over WARNING over NONE:
//!
//! - CRITICAL: net > amount, or unsettled for more than 7 days
//! - WARNING: under-settled, net > 0, no credit seen

use chrono::NaiveDate;
use recon_core::{round_money, IssueFlag, SettlementRecord, SettlementStatus, SettlementType};
use rust_decimal::Decimal;

/// Days a transaction may remain without any settlement before the issue
/// flag escalates to CRITICAL
pub const STALE_PENDING_DAYS: i64 = 7;

/// Tolerance for net-vs-declared amount equality
fn amount_epsilon() -> Decimal {
    Decimal::new(1, 9)
}

/// Inputs to the rule engine
#[derive(Debug, Clone, Copy)]
pub struct RuleInput {
    /// Net settled amount (debits minus credits, rounded)
    pub net_settled: Decimal,

    /// Declared transaction amount
    pub txn_amount: Decimal,

    /// True if at least one credit settlement exists
    pub had_credit: bool,

    /// True if at least one settlement record exists
    pub has_settlement: bool,

    /// Transaction date
    pub txn_date: NaiveDate,

    /// Evaluation date (callers pass the current date)
    pub today: NaiveDate,
}

/// Derived status and issue flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derived {
    /// Settlement status
    pub status: SettlementStatus,

    /// Issue flag
    pub issue: IssueFlag,
}

/// Derive settlement status and issue flag for one transaction
pub fn evaluate(input: &RuleInput) -> Derived {
    Derived {
        status: derive_status(input),
        issue: derive_issue(input),
    }
}

fn derive_status(input: &RuleInput) -> SettlementStatus {
    if !input.has_settlement || input.net_settled == Decimal::ZERO {
        return SettlementStatus::Pending;
    }
    if input.net_settled > input.txn_amount {
        return SettlementStatus::OverSettled;
    }
    if (input.net_settled - input.txn_amount).abs() < amount_epsilon() {
        return SettlementStatus::FullySettled;
    }
    if input.had_credit && input.net_settled < input.txn_amount {
        return SettlementStatus::Refunded;
    }
    if input.net_settled < input.txn_amount {
        return SettlementStatus::Partial;
    }
    SettlementStatus::Pending
}

fn derive_issue(input: &RuleInput) -> IssueFlag {
    let stale = !input.has_settlement
        && (input.today - input.txn_date).num_days() > STALE_PENDING_DAYS;
    if input.net_settled > input.txn_amount || stale {
        return IssueFlag::Critical;
    }

    let under_settled = input.net_settled < input.txn_amount
        && input.net_settled > Decimal::ZERO
        && !input.had_credit;
    if under_settled {
        return IssueFlag::Warning;
    }

    IssueFlag::None
}

/// Settlement history shape feeding the rule engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementAggregate {
    /// Sum of debit amounts
    pub debit_total: Decimal,

    /// Sum of credit amounts
    pub credit_total: Decimal,

    /// Debits minus credits, rounded to 2 decimal places
    pub net_settled: Decimal,

    /// True if any credit record exists
    pub had_credit: bool,

    /// True if any record exists
    pub has_settlement: bool,

    /// Latest settlement date across the history
    pub last_settlement_date: Option<NaiveDate>,
}

/// Aggregate a transaction's settlement history
///
/// The one place debit/credit sums, net, and last settlement date are
/// computed; recomputation, the read path, and the dashboard all use it.
pub fn aggregate(records: &[SettlementRecord]) -> SettlementAggregate {
    let debit_total: Decimal = records
        .iter()
        .filter(|r| r.settlement_type == SettlementType::Debit)
        .map(|r| r.settlement_amount)
        .sum();
    let credit_total: Decimal = records
        .iter()
        .filter(|r| r.settlement_type == SettlementType::Credit)
        .map(|r| r.settlement_amount)
        .sum();

    SettlementAggregate {
        debit_total,
        credit_total,
        net_settled: round_money(debit_total - credit_total),
        had_credit: records
            .iter()
            .any(|r| r.settlement_type == SettlementType::Credit),
        has_settlement: !records.is_empty(),
        last_settlement_date: records.iter().map(|r| r.settlement_date).max(),
    }
}

impl SettlementAggregate {
    /// Build the rule input for this history against a transaction
    pub fn rule_input(
        &self,
        txn_amount: Decimal,
        txn_date: NaiveDate,
        today: NaiveDate,
    ) -> RuleInput {
        RuleInput {
            net_settled: self.net_settled,
            txn_amount,
            had_credit: self.had_credit,
            has_settlement: self.has_settlement,
            txn_date,
            today,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use recon_core::{Currency, SettlementId, SettlementType, TransactionId};

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(n)
    }

    fn input(net_cents: i64, amount_cents: i64, had_credit: bool, has_settlement: bool) -> RuleInput {
        RuleInput {
            net_settled: Decimal::new(net_cents, 2),
            txn_amount: Decimal::new(amount_cents, 2),
            had_credit,
            has_settlement,
            txn_date: day(0),
            today: day(1),
        }
    }

    #[test]
    fn test_status_ordering() {
        // No settlement wins over everything
        assert_eq!(
            evaluate(&input(0, 10000, false, false)).status,
            SettlementStatus::Pending
        );
        // Zero net is pending even with history
        assert_eq!(
            evaluate(&input(0, 10000, true, true)).status,
            SettlementStatus::Pending
        );
        assert_eq!(
            evaluate(&input(15000, 10000, false, true)).status,
            SettlementStatus::OverSettled
        );
        assert_eq!(
            evaluate(&input(10000, 10000, false, true)).status,
            SettlementStatus::FullySettled
        );
        // Exact match beats refund classification
        assert_eq!(
            evaluate(&input(10000, 10000, true, true)).status,
            SettlementStatus::FullySettled
        );
        assert_eq!(
            evaluate(&input(4000, 10000, true, true)).status,
            SettlementStatus::Refunded
        );
        assert_eq!(
            evaluate(&input(4000, 10000, false, true)).status,
            SettlementStatus::Partial
        );
    }

    #[test]
    fn test_negative_net_is_refunded() {
        // Credits exceeding debits imply a credit record existed
        assert_eq!(
            evaluate(&input(-2000, 10000, true, true)).status,
            SettlementStatus::Refunded
        );
    }

    #[test]
    fn test_issue_critical_on_over_settlement() {
        assert_eq!(
            evaluate(&input(15000, 10000, false, true)).issue,
            IssueFlag::Critical
        );
    }

    #[test]
    fn test_issue_critical_on_stale_pending() {
        let mut base = input(0, 10000, false, false);

        base.today = day(STALE_PENDING_DAYS);
        assert_eq!(evaluate(&base).issue, IssueFlag::None);

        // Strictly more than the threshold escalates
        base.today = day(STALE_PENDING_DAYS + 1);
        assert_eq!(evaluate(&base).issue, IssueFlag::Critical);

        // A settled transaction never goes stale
        let settled = input(10000, 10000, false, true);
        assert_eq!(evaluate(&settled).issue, IssueFlag::None);
    }

    #[test]
    fn test_issue_warning_only_without_credits() {
        assert_eq!(
            evaluate(&input(4000, 10000, false, true)).issue,
            IssueFlag::Warning
        );
        // A credit in the history suppresses the warning
        assert_eq!(
            evaluate(&input(4000, 10000, true, true)).issue,
            IssueFlag::None
        );
        // Zero net is not under-settled-in-progress
        assert_eq!(
            evaluate(&input(0, 10000, false, true)).issue,
            IssueFlag::None
        );
    }

    #[test]
    fn test_epsilon_equality() {
        // Just under the declared amount, within tolerance
        let mut nearly = input(0, 10000, false, true);
        nearly.net_settled = Decimal::new(100, 0) - Decimal::new(1, 10);
        nearly.txn_amount = Decimal::new(100, 0);
        assert_eq!(evaluate(&nearly).status, SettlementStatus::FullySettled);

        // Any excess at all classifies as over-settled before the
        // tolerance check applies
        nearly.net_settled = Decimal::new(100, 0) + Decimal::new(1, 10);
        assert_eq!(evaluate(&nearly).status, SettlementStatus::OverSettled);
    }

    fn record(id: &str, amount_cents: i64, settlement_type: SettlementType, d: NaiveDate) -> SettlementRecord {
        SettlementRecord {
            settlement_id: SettlementId::new(id),
            transaction_id: TransactionId::new("TXN-1"),
            lifecycle_id: None,
            settlement_date: d,
            settlement_amount: Decimal::new(amount_cents, 2),
            settlement_type,
            currency: Currency::new("USD"),
        }
    }

    #[test]
    fn test_aggregate() {
        let records = vec![
            record("S-1", 10000, SettlementType::Debit, day(2)),
            record("S-2", 3000, SettlementType::Credit, day(5)),
            record("S-3", 2000, SettlementType::Debit, day(3)),
        ];

        let agg = aggregate(&records);
        assert_eq!(agg.debit_total, Decimal::new(12000, 2));
        assert_eq!(agg.credit_total, Decimal::new(3000, 2));
        assert_eq!(agg.net_settled, Decimal::new(9000, 2));
        assert!(agg.had_credit);
        assert!(agg.has_settlement);
        assert_eq!(agg.last_settlement_date, Some(day(5)));
    }

    #[test]
    fn test_aggregate_empty() {
        let agg = aggregate(&[]);
        assert_eq!(agg.net_settled, Decimal::ZERO);
        assert!(!agg.had_credit);
        assert!(!agg.has_settlement);
        assert_eq!(agg.last_settlement_date, None);
    }
}
