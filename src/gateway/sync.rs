//! Balance and transaction synchronization.

use chrono::NaiveDate;
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{BalanceFailure, GatewayError, Result};
use crate::metrics;
use crate::provider::ProviderAccount;
use crate::store::{Account, NewTransaction, PLAID_SOURCE};

use super::{require, Gateway};

/// Inclusive date range for transaction sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `start` after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(GatewayError::InvalidRequest(format!(
                "start_date {start} is after end_date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// First day of the range.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range.
    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Outcome of a fully successful balance sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceSyncReport {
    /// Accounts whose balance was written.
    pub updated: usize,
}

/// Current balance of the first account of an item, or zero.
pub fn current_balance(accounts: &[ProviderAccount]) -> Decimal {
    accounts
        .first()
        .and_then(|a| a.balances.current)
        .unwrap_or(Decimal::ZERO)
}

impl Gateway {
    /// Refresh the stored balance of every account owned by `user_id`.
    ///
    /// All fetch-then-update pairs run concurrently. Every failure is
    /// collected; successful updates are kept even when others fail.
    #[instrument(skip(self))]
    pub async fn sync_balances(&self, user_id: &str) -> Result<BalanceSyncReport> {
        require("user_id", user_id)?;

        let accounts = self.store.accounts_for_user(user_id).await?;
        if accounts.is_empty() {
            return Err(GatewayError::NoAccounts);
        }

        let results = join_all(accounts.iter().map(|account| self.refresh_balance(account))).await;

        let mut updated = 0;
        let mut failures = Vec::new();
        for (account, result) in accounts.iter().zip(results) {
            match result {
                Ok(()) => updated += 1,
                Err(e) => {
                    warn!(account_id = %account.id, error = %e, "Balance update failed");
                    metrics::inc_balance_update_failures();
                    failures.push(BalanceFailure {
                        account_id: account.id.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if !failures.is_empty() {
            return Err(GatewayError::BalanceSync(failures));
        }

        info!(updated, "Balances synced");
        Ok(BalanceSyncReport { updated })
    }

    async fn refresh_balance(&self, account: &Account) -> Result<()> {
        let item_accounts = self.provider.get_accounts(&account.plaid_id).await?;
        let balance = current_balance(&item_accounts);

        self.store.update_balance(&account.id, balance).await?;
        metrics::inc_balance_updates();
        debug!(account_id = %account.id, %balance, "Balance updated");
        Ok(())
    }

    /// Copy provider transactions in `range` into the store.
    ///
    /// Accounts are processed one after another with one batched insert
    /// each. Rows are never deduplicated, so repeating a sync duplicates
    /// them. The first failure aborts the remaining accounts; rows written
    /// for earlier accounts stay.
    #[instrument(skip(self), fields(start = %range.start(), end = %range.end()))]
    pub async fn sync_transactions(&self, user_id: &str, range: DateRange) -> Result<usize> {
        require("user_id", user_id)?;

        let accounts = self.store.accounts_for_user(user_id).await?;
        let mut count = 0;

        for account in &accounts {
            let transactions = self
                .provider
                .get_transactions(&account.plaid_id, range.start(), range.end())
                .await?;

            let rows: Vec<NewTransaction> = transactions
                .into_iter()
                .map(|tx| NewTransaction {
                    user_id: user_id.to_string(),
                    account_id: account.id.clone(),
                    description: tx.name,
                    amount: tx.amount,
                    date: tx.date,
                    source: PLAID_SOURCE.to_string(),
                })
                .collect();

            let inserted = self.store.insert_transactions(&rows).await?;
            metrics::add_transactions_inserted(inserted as u64);
            debug!(account_id = %account.id, inserted, "Transactions inserted");
            count += inserted;
        }

        info!(accounts = accounts.len(), transactions = count, "Transactions synced");
        Ok(count)
    }
}
