//! Financial-data provider module.
//!
//! This module handles:
//! - The provider interface used by the gateway
//! - Plaid API client
//! - Mock provider for testing

pub mod client;
pub mod mock;
pub mod types;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::ProviderError;

pub use client::PlaidClient;
pub use mock::{MockConfig, MockProvider};
pub use types::{
    AccountBalances, LinkSettings, LinkToken, ProviderAccount, ProviderTransaction,
    TokenExchange,
};

/// Operations the gateway needs from the financial-data provider.
#[async_trait]
pub trait FinancialProvider: Send + Sync {
    /// Mint a short-lived link token scoped to `user_id`.
    async fn create_link_token(&self, user_id: &str) -> Result<LinkToken, ProviderError>;

    /// Exchange a public token from Link for a durable access token.
    async fn exchange_public_token(&self, public_token: &str)
        -> Result<TokenExchange, ProviderError>;

    /// List the accounts of the item behind `access_token`.
    async fn get_accounts(&self, access_token: &str) -> Result<Vec<ProviderAccount>, ProviderError>;

    /// List transactions posted between `start_date` and `end_date`, inclusive.
    ///
    /// Only the first page is returned.
    async fn get_transactions(
        &self,
        access_token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ProviderTransaction>, ProviderError>;
}
