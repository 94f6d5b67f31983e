//! Gateway operations between the provider and the store.
//!
//! Each operation is a short linear sequence of remote calls. Provider and
//! store are injected as trait objects so tests can substitute fakes.

mod sync;

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{GatewayError, Result};
use crate::metrics;
use crate::provider::{FinancialProvider, LinkToken};
use crate::store::{Account, AccountStore, NewAccount};

pub use sync::{current_balance, BalanceSyncReport, DateRange};

/// Result of linking a new item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedAccount {
    /// Durable access token returned by the provider.
    pub access_token: String,
    /// Row inserted into the store.
    pub account: Account,
}

/// The four gateway operations.
#[derive(Clone)]
pub struct Gateway {
    provider: Arc<dyn FinancialProvider>,
    store: Arc<dyn AccountStore>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

impl Gateway {
    /// Create a gateway over the given provider and store.
    pub fn new(provider: Arc<dyn FinancialProvider>, store: Arc<dyn AccountStore>) -> Self {
        Self { provider, store }
    }

    /// Mint a link token for `user_id`.
    #[instrument(skip(self))]
    pub async fn create_link_token(&self, user_id: &str) -> Result<LinkToken> {
        require("user_id", user_id)?;

        let token = self.provider.create_link_token(user_id).await?;
        metrics::inc_link_tokens_created();
        info!("Link token created");
        Ok(token)
    }

    /// Exchange a public token and record the new account.
    ///
    /// If the insert fails after a successful exchange the access token is
    /// orphaned; nothing is rolled back.
    #[instrument(skip(self, public_token))]
    pub async fn exchange_token(&self, public_token: &str, user_id: &str) -> Result<LinkedAccount> {
        require("public_token", public_token)?;
        require("user_id", user_id)?;

        let exchange = self.provider.exchange_public_token(public_token).await?;
        metrics::inc_tokens_exchanged();

        let new_account = NewAccount {
            user_id: user_id.to_string(),
            plaid_id: exchange.access_token.clone(),
        };

        let account = match self.store.insert_account(&new_account).await {
            Ok(account) => account,
            Err(e) => {
                warn!(item_id = %exchange.item_id, error = %e, "Account insert failed after exchange, access token orphaned");
                return Err(e.into());
            }
        };

        info!(account_id = %account.id, item_id = %exchange.item_id, "Linked new item");

        Ok(LinkedAccount {
            access_token: exchange.access_token,
            account,
        })
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(format!("{field} is required")));
    }
    Ok(())
}
