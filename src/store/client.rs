//! Supabase PostgREST client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::StoreError;
use crate::metrics;

use super::types::{Account, AccountId, NewAccount, NewTransaction};
use super::AccountStore;

const ACCOUNTS_TABLE: &str = "accounts";
const TRANSACTIONS_TABLE: &str = "actual_transactions";
const ACCOUNT_COLUMNS: &str = "id,user_id,plaid_id,balance";

/// Supabase REST client.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    /// HTTP client with auth headers preset.
    http: reqwest::Client,
    /// `<project>/rest/v1`.
    rest_url: String,
}

/// PostgREST error body.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct BalanceUpdate {
    balance: Decimal,
}

impl SupabaseStore {
    /// Create a new store client from config.
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let key = &config.supabase_service_role_key;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {key}"))?);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", config.supabase_url.trim_end_matches('/')),
        })
    }

    /// Get the REST endpoint base URL.
    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    /// Send a request and turn non-2xx responses into [`StoreError::Api`].
    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StoreError> {
        let start = Instant::now();
        let response = request.send().await;
        metrics::record_store_latency(start, operation);
        let response = response?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<PostgrestError>(&text) {
            Ok(body) => (body.code, body.message),
            Err(_) => (String::new(), text),
        };

        Err(StoreError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, StoreError> {
    HeaderValue::from_str(value)
        .map_err(|e| StoreError::Decode(format!("invalid header value: {e}")))
}

#[async_trait]
impl AccountStore for SupabaseStore {
    #[instrument(skip(self))]
    async fn accounts_for_user(&self, user_id: &str) -> Result<Vec<Account>, StoreError> {
        let user_filter = format!("eq.{user_id}");
        let request = self
            .http
            .get(self.table_url(ACCOUNTS_TABLE))
            .query(&[("select", ACCOUNT_COLUMNS), ("user_id", user_filter.as_str())]);

        let accounts: Vec<Account> = self
            .send("accounts_select", request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("accounts: {e}")))?;

        debug!(count = accounts.len(), "Loaded accounts");
        Ok(accounts)
    }

    #[instrument(skip_all, fields(user_id = %account.user_id))]
    async fn insert_account(&self, account: &NewAccount) -> Result<Account, StoreError> {
        let request = self
            .http
            .post(self.table_url(ACCOUNTS_TABLE))
            .query(&[("select", ACCOUNT_COLUMNS)])
            .header("Prefer", "return=representation")
            .json(account);

        let rows: Vec<Account> = self
            .send("accounts_insert", request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("accounts insert: {e}")))?;

        rows.into_iter().next().ok_or(StoreError::EmptyInsert {
            table: ACCOUNTS_TABLE,
        })
    }

    #[instrument(skip(self), fields(account_id = %id))]
    async fn update_balance(&self, id: &AccountId, balance: Decimal) -> Result<(), StoreError> {
        let id_filter = format!("eq.{id}");
        let request = self
            .http
            .patch(self.table_url(ACCOUNTS_TABLE))
            .query(&[("id", id_filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(&BalanceUpdate { balance });

        self.send("accounts_update", request).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(rows = rows.len()))]
    async fn insert_transactions(&self, rows: &[NewTransaction]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let request = self
            .http
            .post(self.table_url(TRANSACTIONS_TABLE))
            .header("Prefer", "return=minimal")
            .json(rows);

        self.send("transactions_insert", request).await?;
        Ok(rows.len())
    }
}
