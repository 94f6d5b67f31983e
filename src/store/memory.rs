//! In-memory account store for tests and local runs.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::StoreError;

use super::types::{Account, AccountId, NewAccount, NewTransaction};
use super::AccountStore;

#[derive(Debug, Default)]
struct Tables {
    accounts: Vec<Account>,
    transactions: Vec<NewTransaction>,
    next_id: i64,
    failing_updates: HashSet<AccountId>,
    fail_inserts: bool,
    transaction_batches: usize,
}

/// Store backed by two vectors. Ids are assigned sequentially from 1.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed an account row.
    pub fn add_account(&self, user_id: &str, plaid_id: &str) -> Account {
        let mut tables = self.tables();
        tables.next_id += 1;
        let account = Account {
            id: AccountId::Int(tables.next_id),
            user_id: user_id.to_string(),
            plaid_id: plaid_id.to_string(),
            balance: None,
        };
        tables.accounts.push(account.clone());
        account
    }

    /// Snapshot of all account rows.
    pub fn accounts(&self) -> Vec<Account> {
        self.tables().accounts.clone()
    }

    /// Snapshot of all transaction rows.
    pub fn transactions(&self) -> Vec<NewTransaction> {
        self.tables().transactions.clone()
    }

    /// Number of batched transaction writes received.
    pub fn transaction_batches(&self) -> usize {
        self.tables().transaction_batches
    }

    /// Make balance updates for this account fail.
    pub fn fail_balance_update(&self, id: AccountId) {
        self.tables().failing_updates.insert(id);
    }

    /// Make every insert fail.
    pub fn fail_inserts(&self) {
        self.tables().fail_inserts = true;
    }
}

fn insert_failure() -> StoreError {
    StoreError::Api {
        status: 500,
        code: "XX000".to_string(),
        message: "insert rejected".to_string(),
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn accounts_for_user(&self, user_id: &str) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .tables()
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_account(&self, account: &NewAccount) -> Result<Account, StoreError> {
        if self.tables().fail_inserts {
            return Err(insert_failure());
        }
        Ok(self.add_account(&account.user_id, &account.plaid_id))
    }

    async fn update_balance(&self, id: &AccountId, balance: Decimal) -> Result<(), StoreError> {
        let mut tables = self.tables();

        if tables.failing_updates.contains(id) {
            return Err(StoreError::Api {
                status: 500,
                code: "XX000".to_string(),
                message: format!("update of account {id} rejected"),
            });
        }

        // PATCH on a missing row matches nothing and still succeeds.
        if let Some(account) = tables.accounts.iter_mut().find(|a| &a.id == id) {
            account.balance = Some(balance);
        }
        Ok(())
    }

    async fn insert_transactions(&self, rows: &[NewTransaction]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tables = self.tables();
        if tables.fail_inserts {
            return Err(insert_failure());
        }

        tables.transaction_batches += 1;
        tables.transactions.extend_from_slice(rows);
        Ok(rows.len())
    }
}
