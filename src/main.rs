//! Cashflow gateway entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*};

use cashflow_gateway::api::{create_router, AppState};
use cashflow_gateway::config::{mask_secret, Config};
use cashflow_gateway::metrics;
use cashflow_gateway::provider::PlaidClient;
use cashflow_gateway::store::SupabaseStore;
use cashflow_gateway::utils::{log_filter, shutdown_signal};
use cashflow_gateway::Gateway;

/// Backend gateway linking Plaid accounts into Supabase.
#[derive(Parser, Debug)]
#[command(name = "cashflow-gateway")]
#[command(about = "Link token, token exchange and sync endpoints for Plaid + Supabase")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Listen port, overrides PORT.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // .env may carry RUST_LOG, so read it before the filter is built
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = log_filter(args.verbose, std::env::var("RUST_LOG").ok().as_deref());
    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Serve { port }) => cmd_serve(port).await,
        None => cmd_serve(None).await,
    }
}

/// Load configuration and fail on invalid values.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().context("Configuration load failed")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;
    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CASHFLOW GATEWAY - CONFIGURATION CHECK");
    println!("======================================================================");

    let config = load_config()?;

    println!("Configuration Summary:");
    println!("  Plaid Environment: {}", config.plaid_env);
    println!("  Plaid URL: {}", config.plaid_url());
    println!("  Plaid Client ID: {}", mask_secret(&config.plaid_client_id));
    println!("  Plaid Secret: {}", mask_secret(&config.plaid_secret));
    println!("  Link Client Name: {}", config.plaid_client_name);
    println!("  Supabase URL: {}", config.supabase_url);
    println!("  Supabase Key: {}", mask_secret(&config.supabase_service_role_key));
    println!("  Listen: {}:{}", config.host, config.port);
    println!("  HTTP Timeout: {}ms", config.http_timeout_ms);
    println!(
        "  Metrics: {}",
        if config.metrics_enabled {
            format!("Enabled (port {})", config.metrics_port)
        } else {
            "Disabled".to_string()
        }
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the HTTP server until shutdown.
async fn cmd_serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = load_config()?;

    metrics::init_metrics();
    if config.metrics_enabled {
        let metrics_addr: SocketAddr = format!("{}:{}", config.host, config.metrics_port)
            .parse()
            .context("Invalid metrics address")?;
        metrics::install_exporter(metrics_addr)?;
    }

    let provider = PlaidClient::new(&config)?;
    let store = SupabaseStore::new(&config)?;
    info!(plaid = %provider.base_url(), supabase = %store.rest_url(), "Clients ready");

    let gateway = Gateway::new(Arc::new(provider), Arc::new(store));
    let router = create_router(AppState::new(gateway));

    let addr: SocketAddr = format!("{}:{}", config.host, port.unwrap_or(config.port))
        .parse()
        .context("Invalid listen address")?;
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
