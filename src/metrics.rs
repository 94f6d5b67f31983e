//! Prometheus metrics for upstream latency and sync activity.
//!
//! This module provides metrics for:
//! - Provider (Plaid) request latency
//! - Store (Supabase) request latency
//! - Linking and synchronization counters

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::{debug, info};

// === Metric Name Constants ===

/// Provider request latency metric name.
pub const METRIC_PROVIDER_REQUEST_LATENCY: &str = "provider_request_latency_ms";
/// Store request latency metric name.
pub const METRIC_STORE_REQUEST_LATENCY: &str = "store_request_latency_ms";
/// Link tokens created counter metric name.
pub const METRIC_LINK_TOKENS_CREATED: &str = "link_tokens_created_total";
/// Public tokens exchanged counter metric name.
pub const METRIC_TOKENS_EXCHANGED: &str = "tokens_exchanged_total";
/// Balance updates counter metric name.
pub const METRIC_BALANCE_UPDATES: &str = "balance_updates_total";
/// Failed balance updates counter metric name.
pub const METRIC_BALANCE_UPDATE_FAILURES: &str = "balance_update_failures_total";
/// Transactions inserted counter metric name.
pub const METRIC_TRANSACTIONS_INSERTED: &str = "transactions_inserted_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_PROVIDER_REQUEST_LATENCY,
        "Provider request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_STORE_REQUEST_LATENCY,
        "Store request latency in milliseconds"
    );

    describe_counter!(
        METRIC_LINK_TOKENS_CREATED,
        "Total number of link tokens created"
    );
    describe_counter!(
        METRIC_TOKENS_EXCHANGED,
        "Total number of public tokens exchanged"
    );
    describe_counter!(
        METRIC_BALANCE_UPDATES,
        "Total number of account balances written"
    );
    describe_counter!(
        METRIC_BALANCE_UPDATE_FAILURES,
        "Total number of failed balance fetch/update pairs"
    );
    describe_counter!(
        METRIC_TRANSACTIONS_INSERTED,
        "Total number of transaction rows inserted"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus exporter with its own HTTP listener.
pub fn install_exporter(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Record provider request latency.
pub fn record_provider_latency(start: Instant, endpoint: &'static str) {
    histogram!(METRIC_PROVIDER_REQUEST_LATENCY, "endpoint" => endpoint).record(elapsed_ms(start));
}

/// Record store request latency.
pub fn record_store_latency(start: Instant, operation: &'static str) {
    histogram!(METRIC_STORE_REQUEST_LATENCY, "operation" => operation).record(elapsed_ms(start));
}

/// Increment link tokens created counter.
pub fn inc_link_tokens_created() {
    counter!(METRIC_LINK_TOKENS_CREATED).increment(1);
}

/// Increment tokens exchanged counter.
pub fn inc_tokens_exchanged() {
    counter!(METRIC_TOKENS_EXCHANGED).increment(1);
}

/// Increment balance updates counter.
pub fn inc_balance_updates() {
    counter!(METRIC_BALANCE_UPDATES).increment(1);
}

/// Increment failed balance updates counter.
pub fn inc_balance_update_failures() {
    counter!(METRIC_BALANCE_UPDATE_FAILURES).increment(1);
}

/// Add to the transactions inserted counter.
pub fn add_transactions_inserted(count: u64) {
    counter!(METRIC_TRANSACTIONS_INSERTED).increment(count);
}
