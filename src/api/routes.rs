//! HTTP API route definitions.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{
    create_link_token, get_access_token, health, sync_accounts, sync_transactions, AppState,
};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(health))
        // Linking
        .route("/create_link_token", post(create_link_token))
        .route("/get_access_token", post(get_access_token))
        // Sync
        .route("/sync_accounts", post(sync_accounts))
        .route("/sync_transactions", post(sync_transactions))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
