//! Unified error types for the gateway.

use serde::Serialize;
use thiserror::Error;

/// Unified error type for the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Financial-data provider error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Data store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The user has no linked accounts.
    #[error("no accounts found")]
    NoAccounts,

    /// Request body failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// One or more balance updates failed.
    #[error("{} of the balance updates failed", .0.len())]
    BalanceSync(Vec<BalanceFailure>),
}

/// A single failed fetch-then-update pair from the balance fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceFailure {
    /// Store id of the account that failed.
    pub account_id: String,
    /// Error message.
    pub error: String,
}

/// Financial-data provider errors.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider answered with an error payload.
    #[error("{error_code} ({status}): {message}")]
    Api {
        /// HTTP status returned by the provider.
        status: u16,
        /// Provider error category, e.g. `INVALID_INPUT`.
        error_type: String,
        /// Provider error code, e.g. `INVALID_PUBLIC_TOKEN`.
        error_code: String,
        /// Human readable message.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("failed to decode provider response: {0}")]
    Decode(String),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Data store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store answered with an error payload.
    #[error("{message} (status {status}, code {code})")]
    Api {
        /// HTTP status returned by the store.
        status: u16,
        /// PostgREST / Postgres error code.
        code: String,
        /// Human readable message.
        message: String,
    },

    /// An insert returned no rows.
    #[error("insert into {table} returned no rows")]
    EmptyInsert {
        /// Target table.
        table: &'static str,
    },

    /// Response body could not be decoded.
    #[error("failed to decode store response: {0}")]
    Decode(String),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, GatewayError>;
