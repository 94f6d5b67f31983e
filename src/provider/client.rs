//! Plaid REST API client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::ProviderError;
use crate::metrics;

use super::types::{
    AccountsGetResponse, LinkSettings, LinkToken, PlaidErrorBody, ProviderAccount,
    ProviderTransaction, TokenExchange, TransactionsGetResponse,
};
use super::FinancialProvider;

/// Plaid API client.
#[derive(Debug, Clone)]
pub struct PlaidClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// API base URL.
    base_url: String,
    /// Plaid client id.
    client_id: String,
    /// Plaid secret.
    secret: String,
    /// Link token configuration.
    link: LinkSettings,
}

/// Request body with the credentials Plaid expects in every call.
#[derive(Serialize)]
struct Authenticated<'a, B: Serialize> {
    client_id: &'a str,
    secret: &'a str,
    #[serde(flatten)]
    body: B,
}

#[derive(Serialize)]
struct LinkTokenCreateRequest<'a> {
    client_name: &'a str,
    user: LinkUser<'a>,
    products: &'a [String],
    country_codes: &'a [String],
    language: &'a str,
}

#[derive(Serialize)]
struct LinkUser<'a> {
    client_user_id: &'a str,
}

#[derive(Serialize)]
struct PublicTokenExchangeRequest<'a> {
    public_token: &'a str,
}

#[derive(Serialize)]
struct AccessTokenRequest<'a> {
    access_token: &'a str,
}

#[derive(Serialize)]
struct TransactionsGetRequest<'a> {
    access_token: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl PlaidClient {
    /// Create a new Plaid client from config.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            base_url: config.plaid_url().trim_end_matches('/').to_string(),
            client_id: config.plaid_client_id.clone(),
            secret: config.plaid_secret.clone(),
            link: LinkSettings::new(config.plaid_client_name.clone()),
        })
    }

    /// Get the API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the link token configuration.
    pub fn link_settings(&self) -> &LinkSettings {
        &self.link
    }

    /// POST an authenticated request and decode the JSON response.
    async fn post<B, R>(&self, path: &'static str, body: B) -> Result<R, ProviderError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let start = Instant::now();

        let response = self
            .http
            .post(&url)
            .json(&Authenticated {
                client_id: &self.client_id,
                secret: &self.secret,
                body,
            })
            .send()
            .await;

        metrics::record_provider_latency(start, path);
        let response = response?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &text));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("{path}: {e}")))
    }
}

/// Build an API error from a Plaid error body, falling back to the raw text.
fn api_error(status: u16, text: &str) -> ProviderError {
    match serde_json::from_str::<PlaidErrorBody>(text) {
        Ok(body) => ProviderError::Api {
            status,
            error_type: body.error_type,
            error_code: body.error_code,
            message: body.error_message,
        },
        Err(_) => ProviderError::Api {
            status,
            error_type: String::new(),
            error_code: "HTTP_ERROR".to_string(),
            message: text.to_string(),
        },
    }
}

#[async_trait]
impl FinancialProvider for PlaidClient {
    #[instrument(skip(self))]
    async fn create_link_token(&self, user_id: &str) -> Result<LinkToken, ProviderError> {
        let request = LinkTokenCreateRequest {
            client_name: &self.link.client_name,
            user: LinkUser {
                client_user_id: user_id,
            },
            products: &self.link.products,
            country_codes: &self.link.country_codes,
            language: &self.link.language,
        };

        let token: LinkToken = self.post("/link/token/create", request).await?;
        debug!(expiration = %token.expiration, "Created link token");
        Ok(token)
    }

    #[instrument(skip_all)]
    async fn exchange_public_token(
        &self,
        public_token: &str,
    ) -> Result<TokenExchange, ProviderError> {
        let exchange: TokenExchange = self
            .post(
                "/item/public_token/exchange",
                PublicTokenExchangeRequest { public_token },
            )
            .await?;
        debug!(item_id = %exchange.item_id, "Exchanged public token");
        Ok(exchange)
    }

    #[instrument(skip_all)]
    async fn get_accounts(&self, access_token: &str) -> Result<Vec<ProviderAccount>, ProviderError> {
        let response: AccountsGetResponse = self
            .post("/accounts/get", AccessTokenRequest { access_token })
            .await?;
        debug!(count = response.accounts.len(), "Fetched item accounts");
        Ok(response.accounts)
    }

    #[instrument(skip(self, access_token))]
    async fn get_transactions(
        &self,
        access_token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ProviderTransaction>, ProviderError> {
        let response: TransactionsGetResponse = self
            .post(
                "/transactions/get",
                TransactionsGetRequest {
                    access_token,
                    start_date,
                    end_date,
                },
            )
            .await?;

        if let Some(total) = response.total_transactions {
            if total > response.transactions.len() {
                warn!(
                    total,
                    returned = response.transactions.len(),
                    "Only the first page of transactions was fetched"
                );
            }
        }

        debug!(count = response.transactions.len(), "Fetched transactions");
        Ok(response.transactions)
    }
}
