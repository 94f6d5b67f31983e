//! Mock provider for unit testing.
//!
//! Serves canned link tokens, exchanges, accounts and transactions keyed by
//! access token without making network requests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::ProviderError;

use super::types::{
    AccountBalances, LinkToken, ProviderAccount, ProviderTransaction, TokenExchange,
};
use super::FinancialProvider;

/// Configuration for mock provider behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether to fail link token requests.
    pub fail_link_token: bool,
    /// Whether to fail token exchanges.
    pub fail_exchange: bool,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

#[derive(Debug, Default)]
struct MockState {
    exchanges: HashMap<String, String>,
    accounts: HashMap<String, Vec<ProviderAccount>>,
    transactions: HashMap<String, Vec<ProviderTransaction>>,
    failing_tokens: HashSet<String>,
    transaction_calls: Vec<(String, NaiveDate, NaiveDate)>,
}

/// Mock provider for testing.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    /// Mock configuration.
    config: MockConfig,
    /// Canned responses.
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new mock provider with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock provider with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            state: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Map a public token to the access token the exchange returns.
    pub fn set_exchange(&self, public_token: &str, access_token: &str) {
        self.state()
            .exchanges
            .insert(public_token.to_string(), access_token.to_string());
    }

    /// Set the item accounts returned for an access token.
    pub fn set_accounts(&self, access_token: &str, accounts: Vec<ProviderAccount>) {
        self.state()
            .accounts
            .insert(access_token.to_string(), accounts);
    }

    /// Set a single account with the given current balance.
    pub fn set_current_balance(&self, access_token: &str, current: Option<Decimal>) {
        self.set_accounts(
            access_token,
            vec![ProviderAccount {
                account_id: format!("{access_token}-acc"),
                name: None,
                balances: AccountBalances {
                    current,
                    ..Default::default()
                },
            }],
        );
    }

    /// Set the transactions returned for an access token.
    pub fn set_transactions(&self, access_token: &str, transactions: Vec<ProviderTransaction>) {
        self.state()
            .transactions
            .insert(access_token.to_string(), transactions);
    }

    /// Make every account and transaction call for this access token fail.
    pub fn fail_access_token(&self, access_token: &str) {
        self.state().failing_tokens.insert(access_token.to_string());
    }

    /// Transaction requests seen so far, in call order.
    pub fn transaction_calls(&self) -> Vec<(String, NaiveDate, NaiveDate)> {
        self.state().transaction_calls.clone()
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    fn check_token(&self, access_token: &str) -> Result<(), ProviderError> {
        if self.state().failing_tokens.contains(access_token) {
            return Err(mock_error("ITEM_LOGIN_REQUIRED", "Mock item failure"));
        }
        Ok(())
    }
}

fn mock_error(code: &str, message: &str) -> ProviderError {
    ProviderError::Api {
        status: 400,
        error_type: "ITEM_ERROR".to_string(),
        error_code: code.to_string(),
        message: message.to_string(),
    }
}

#[async_trait]
impl FinancialProvider for MockProvider {
    async fn create_link_token(&self, user_id: &str) -> Result<LinkToken, ProviderError> {
        self.simulate_latency().await;

        if self.config.fail_link_token {
            return Err(mock_error("INTERNAL_SERVER_ERROR", "Mock link token failure"));
        }

        Ok(LinkToken {
            link_token: format!("link-mock-{user_id}"),
            expiration: "2030-01-01T00:00:00Z".to_string(),
            request_id: "mock-request".to_string(),
            extra: Default::default(),
        })
    }

    async fn exchange_public_token(
        &self,
        public_token: &str,
    ) -> Result<TokenExchange, ProviderError> {
        self.simulate_latency().await;

        if self.config.fail_exchange {
            return Err(mock_error("INVALID_PUBLIC_TOKEN", "Mock exchange failure"));
        }

        let access_token = self
            .state()
            .exchanges
            .get(public_token)
            .cloned()
            .unwrap_or_else(|| format!("access-mock-{public_token}"));

        Ok(TokenExchange {
            access_token,
            item_id: format!("item-{public_token}"),
            request_id: "mock-request".to_string(),
        })
    }

    async fn get_accounts(&self, access_token: &str) -> Result<Vec<ProviderAccount>, ProviderError> {
        self.simulate_latency().await;
        self.check_token(access_token)?;

        Ok(self
            .state()
            .accounts
            .get(access_token)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_transactions(
        &self,
        access_token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ProviderTransaction>, ProviderError> {
        self.simulate_latency().await;

        let mut state = self.state();
        state
            .transaction_calls
            .push((access_token.to_string(), start_date, end_date));

        if state.failing_tokens.contains(access_token) {
            return Err(mock_error("ITEM_LOGIN_REQUIRED", "Mock item failure"));
        }

        Ok(state
            .transactions
            .get(access_token)
            .cloned()
            .unwrap_or_default())
    }
}

/// Builder for provider transactions in tests.
pub fn transaction(id: &str, name: &str, amount: Decimal, date: NaiveDate) -> ProviderTransaction {
    ProviderTransaction {
        transaction_id: id.to_string(),
        account_id: "mock-account".to_string(),
        name: name.to_string(),
        amount,
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn mock_exchange_uses_mapping() {
        let provider = MockProvider::new();
        provider.set_exchange("pt-1", "at-1");

        let exchange = provider.exchange_public_token("pt-1").await.unwrap();
        assert_eq!(exchange.access_token, "at-1");
    }

    #[tokio::test]
    async fn mock_accounts_and_failures() {
        let provider = MockProvider::new();
        provider.set_current_balance("at-1", Some(dec!(100)));
        provider.fail_access_token("at-2");

        let accounts = provider.get_accounts("at-1").await.unwrap();
        assert_eq!(accounts[0].balances.current, Some(dec!(100)));
        assert!(provider.get_accounts("at-2").await.is_err());
    }

    #[tokio::test]
    async fn mock_records_transaction_calls() {
        let provider = MockProvider::new();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        let txs = provider.get_transactions("at-1", start, end).await.unwrap();
        assert!(txs.is_empty());
        assert_eq!(
            provider.transaction_calls(),
            vec![("at-1".to_string(), start, end)]
        );
    }

    #[tokio::test]
    async fn mock_failure_modes() {
        let provider = MockProvider::with_config(MockConfig {
            fail_link_token: true,
            ..Default::default()
        });

        assert!(provider.create_link_token("u1").await.is_err());
    }
}
