//! In-memory reference store
//!
//! Backs both store traits with BTreeMaps behind a read/write lock.
//! BTreeMap keys give deterministic iteration order, so lookups that return
//! candidate lists are stable across runs.

use crate::error::{Error, Result};
use crate::store::{SettlementStore, TransactionStore};
use crate::types::{
    AccountId, SettlementId, SettlementRecord, SettlementStatus, Transaction, TransactionId,
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// In-memory store implementing both store traits
#[derive(Debug, Default)]
pub struct MemoryStore {
    transactions: RwLock<BTreeMap<TransactionId, Transaction>>,
    settlements: RwLock<BTreeMap<SettlementId, SettlementRecord>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionStore for MemoryStore {
    fn get(&self, id: &TransactionId) -> Result<Option<Transaction>> {
        Ok(self.transactions.read().get(id).cloned())
    }

    fn find_by_lifecycle_id(&self, lifecycle_id: &str) -> Result<Option<Transaction>> {
        Ok(self
            .transactions
            .read()
            .values()
            .find(|t| t.lifecycle_id.as_deref() == Some(lifecycle_id))
            .cloned())
    }

    fn find_exact(
        &self,
        account_id: &AccountId,
        merchant_name: &str,
        date: NaiveDate,
    ) -> Result<Option<Transaction>> {
        Ok(self
            .transactions
            .read()
            .values()
            .find(|t| {
                t.account_id == *account_id
                    && t.merchant_name == merchant_name
                    && t.transaction_date == date
            })
            .cloned())
    }

    fn find_window(
        &self,
        account_id: &AccountId,
        merchant_name: &str,
        around: NaiveDate,
        window_days: i64,
    ) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions
            .read()
            .values()
            .filter(|t| {
                t.account_id == *account_id
                    && t.merchant_name == merchant_name
                    && (t.transaction_date - around).num_days().abs() <= window_days
            })
            .cloned()
            .collect())
    }

    fn list(&self, status: Option<SettlementStatus>) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions
            .read()
            .values()
            .filter(|t| status.map_or(true, |s| t.settlement_status == s))
            .cloned()
            .collect())
    }

    fn upsert(&self, txn: Transaction) -> Result<()> {
        self.transactions
            .write()
            .insert(txn.transaction_id.clone(), txn);
        Ok(())
    }

    fn update_aggregates(
        &self,
        id: &TransactionId,
        status: SettlementStatus,
        total_settled: Decimal,
        last_settlement_date: Option<NaiveDate>,
    ) -> Result<()> {
        let mut transactions = self.transactions.write();
        let txn = transactions
            .get_mut(id)
            .ok_or_else(|| Error::TransactionNotFound(id.to_string()))?;

        txn.settlement_status = status;
        txn.total_settled_amount = total_settled;
        txn.last_settlement_date = last_settlement_date;

        tracing::debug!(
            transaction_id = %id,
            status = %status,
            net = %total_settled,
            "Transaction aggregates updated"
        );

        Ok(())
    }

    fn count(&self) -> Result<u64> {
        Ok(self.transactions.read().len() as u64)
    }
}

impl SettlementStore for MemoryStore {
    fn exists(&self, id: &SettlementId) -> Result<bool> {
        Ok(self.settlements.read().contains_key(id))
    }

    fn insert(&self, record: SettlementRecord) -> Result<()> {
        let mut settlements = self.settlements.write();
        if settlements.contains_key(&record.settlement_id) {
            return Err(Error::DuplicateSettlement(
                record.settlement_id.to_string(),
            ));
        }

        tracing::debug!(
            settlement_id = %record.settlement_id,
            transaction_id = %record.transaction_id,
            "Settlement record inserted"
        );

        settlements.insert(record.settlement_id.clone(), record);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut settlements = self.settlements.write();
        let dropped = settlements.len();
        settlements.clear();
        tracing::debug!(dropped, "Settlement ledger cleared");
        Ok(())
    }

    fn list_for_transaction(&self, id: &TransactionId) -> Result<Vec<SettlementRecord>> {
        let mut records: Vec<SettlementRecord> = self
            .settlements
            .read()
            .values()
            .filter(|r| r.transaction_id == *id)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.settlement_date
                .cmp(&b.settlement_date)
                .then_with(|| a.settlement_id.cmp(&b.settlement_id))
        });
        Ok(records)
    }

    fn snapshot(&self) -> Result<Vec<SettlementRecord>> {
        Ok(self.settlements.read().values().cloned().collect())
    }

    fn restore(&self, records: Vec<SettlementRecord>) -> Result<()> {
        let mut settlements = self.settlements.write();
        settlements.clear();
        for record in records {
            settlements.insert(record.settlement_id.clone(), record);
        }
        Ok(())
    }

    fn count(&self) -> Result<u64> {
        Ok(self.settlements.read().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, LifecycleStatus, SettlementType};

    fn test_transaction(id: &str, date: NaiveDate) -> Transaction {
        Transaction {
            transaction_id: TransactionId::new(id),
            lifecycle_id: Some(format!("LC-{id}")),
            account_id: AccountId::new("ACC-1"),
            merchant_name: "Acme Corp".to_string(),
            transaction_date: date,
            transaction_amount: Decimal::new(10000, 2),
            currency: Some(Currency::new("USD")),
            status: LifecycleStatus::Active,
            settlement_status: SettlementStatus::Pending,
            total_settled_amount: Decimal::ZERO,
            last_settlement_date: None,
        }
    }

    fn test_record(id: &str, txn_id: &str, date: NaiveDate) -> SettlementRecord {
        SettlementRecord {
            settlement_id: SettlementId::new(id),
            transaction_id: TransactionId::new(txn_id),
            lifecycle_id: None,
            settlement_date: date,
            settlement_amount: Decimal::new(10000, 2),
            settlement_type: SettlementType::Debit,
            currency: Currency::new("USD"),
        }
    }

    #[test]
    fn test_lifecycle_lookup() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        store.upsert(test_transaction("TXN-1", date)).unwrap();

        let found = store.find_by_lifecycle_id("LC-TXN-1").unwrap();
        assert_eq!(
            found.unwrap().transaction_id,
            TransactionId::new("TXN-1")
        );
        assert!(store.find_by_lifecycle_id("LC-MISSING").unwrap().is_none());
    }

    #[test]
    fn test_window_lookup() {
        let store = MemoryStore::new();
        let base = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        store.upsert(test_transaction("TXN-1", base)).unwrap();
        store
            .upsert(test_transaction(
                "TXN-2",
                NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            ))
            .unwrap();

        let account = AccountId::new("ACC-1");
        let hits = store
            .find_window(&account, "Acme Corp", base, 1)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].transaction_id, TransactionId::new("TXN-1"));

        let hits = store
            .find_window(&account, "Acme Corp", base, 2)
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        store.insert(test_record("S-1", "TXN-1", date)).unwrap();

        let err = store.insert(test_record("S-1", "TXN-1", date)).unwrap_err();
        assert!(matches!(err, Error::DuplicateSettlement(_)));
        assert_eq!(SettlementStore::count(&store).unwrap(), 1);
    }

    #[test]
    fn test_list_for_transaction_ordered() {
        let store = MemoryStore::new();
        store
            .insert(test_record(
                "S-2",
                "TXN-1",
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            ))
            .unwrap();
        store
            .insert(test_record(
                "S-1",
                "TXN-1",
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            ))
            .unwrap();
        store
            .insert(test_record(
                "S-3",
                "TXN-2",
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ))
            .unwrap();

        let records = store
            .list_for_transaction(&TransactionId::new("TXN-1"))
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].settlement_id, SettlementId::new("S-1"));
        assert_eq!(records[1].settlement_id, SettlementId::new("S-2"));
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        store.insert(test_record("S-1", "TXN-1", date)).unwrap();

        let snapshot = store.snapshot().unwrap();
        store.clear().unwrap();
        store.insert(test_record("S-9", "TXN-9", date)).unwrap();

        store.restore(snapshot).unwrap();
        assert_eq!(SettlementStore::count(&store).unwrap(), 1);
        assert!(store.exists(&SettlementId::new("S-1")).unwrap());
        assert!(!store.exists(&SettlementId::new("S-9")).unwrap());
    }

    #[test]
    fn test_update_aggregates_missing_transaction() {
        let store = MemoryStore::new();
        let err = store
            .update_aggregates(
                &TransactionId::new("TXN-404"),
                SettlementStatus::FullySettled,
                Decimal::new(10000, 2),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, Error::TransactionNotFound(_)));
    }
}
