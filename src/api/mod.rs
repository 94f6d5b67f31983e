//! HTTP API module for the gateway endpoints.

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ErrorResponse;
pub use handlers::AppState;
pub use routes::create_router;
