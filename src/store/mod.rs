//! Data store module.
//!
//! This module handles:
//! - The store interface used by the gateway
//! - Supabase PostgREST client
//! - In-memory store for testing

pub mod client;
pub mod memory;
pub mod types;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::StoreError;

pub use client::SupabaseStore;
pub use memory::MemoryStore;
pub use types::{Account, AccountId, NewAccount, NewTransaction, PLAID_SOURCE};

/// Operations the gateway needs from the data store.
///
/// Nothing here is transactional; each call is an independent write.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// All accounts owned by `user_id`.
    async fn accounts_for_user(&self, user_id: &str) -> Result<Vec<Account>, StoreError>;

    /// Insert one account and return the stored row.
    async fn insert_account(&self, account: &NewAccount) -> Result<Account, StoreError>;

    /// Overwrite the balance of one account.
    async fn update_balance(&self, id: &AccountId, balance: Decimal) -> Result<(), StoreError>;

    /// Insert all rows in a single write, returning the number inserted.
    async fn insert_transactions(&self, rows: &[NewTransaction]) -> Result<usize, StoreError>;
}
