//! Backend gateway between a client app, Plaid and a Supabase store.
//!
//! Four endpoints mediate the account-linking flow and keep the store in
//! sync with the provider:
//!
//! ```text
//! POST /create_link_token   user_id                        -> link token payload
//! POST /get_access_token    public_token, user_id          -> {access_token, account}
//! POST /sync_accounts       user_id                        -> {success, updated}
//! POST /sync_transactions   user_id, start_date, end_date  -> {transactions}
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`provider`]: Financial-data provider trait, Plaid client and mock
//! - [`store`]: Account store trait, Supabase client and in-memory store
//! - [`gateway`]: The four gateway operations
//! - [`api`]: HTTP routes and handlers
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod provider;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{GatewayError, Result};
pub use gateway::Gateway;
