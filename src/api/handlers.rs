//! HTTP API handlers.

use std::sync::Arc;

use axum::{
    extract::{FromRequest, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::gateway::{DateRange, Gateway, LinkedAccount};
use crate::provider::LinkToken;

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Gateway operations.
    pub gateway: Arc<Gateway>,
}

impl AppState {
    /// Create new app state.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

/// JSON body extractor whose rejections render as `{error}` with status 400.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(GatewayError))]
pub struct ApiJson<T>(pub T);

/// Body of requests that only identify a user.
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    /// User identifier.
    pub user_id: String,
}

/// Body of `/get_access_token`.
#[derive(Debug, Deserialize)]
pub struct ExchangeRequest {
    /// Public token from Plaid Link.
    pub public_token: String,
    /// User identifier.
    pub user_id: String,
}

/// Body of `/sync_transactions`.
#[derive(Debug, Deserialize)]
pub struct SyncTransactionsRequest {
    /// User identifier.
    pub user_id: String,
    /// First day, `YYYY-MM-DD`.
    pub start_date: NaiveDate,
    /// Last day, `YYYY-MM-DD`.
    pub end_date: NaiveDate,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Balance sync response.
#[derive(Debug, Serialize)]
pub struct SyncAccountsResponse {
    /// Always true; failures are returned as errors.
    pub success: bool,
    /// Accounts updated.
    pub updated: usize,
}

/// Transaction sync response.
#[derive(Debug, Serialize)]
pub struct SyncTransactionsResponse {
    /// Rows inserted.
    pub transactions: usize,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// `POST /create_link_token`
pub async fn create_link_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UserRequest>,
) -> Result<Json<LinkToken>, GatewayError> {
    let token = state.gateway.create_link_token(&request.user_id).await?;
    Ok(Json(token))
}

/// `POST /get_access_token`
pub async fn get_access_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ExchangeRequest>,
) -> Result<Json<LinkedAccount>, GatewayError> {
    let linked = state
        .gateway
        .exchange_token(&request.public_token, &request.user_id)
        .await?;
    Ok(Json(linked))
}

/// `POST /sync_accounts`
pub async fn sync_accounts(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UserRequest>,
) -> Result<Json<SyncAccountsResponse>, GatewayError> {
    let report = state.gateway.sync_balances(&request.user_id).await?;
    Ok(Json(SyncAccountsResponse {
        success: true,
        updated: report.updated,
    }))
}

/// `POST /sync_transactions`
pub async fn sync_transactions(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SyncTransactionsRequest>,
) -> Result<Json<SyncTransactionsResponse>, GatewayError> {
    let range = DateRange::new(request.start_date, request.end_date)?;
    let transactions = state
        .gateway
        .sync_transactions(&request.user_id, range)
        .await?;
    Ok(Json(SyncTransactionsResponse { transactions }))
}
