//! Utility functions.

use tracing::info;
use tracing_subscriber::EnvFilter;

const VERBOSE_DIRECTIVES: &str = "cashflow_gateway=debug,tower_http=debug,info";

/// Log filter from the `--verbose` flag and `RUST_LOG`, defaulting to `info`.
///
/// An unparsable `RUST_LOG` falls back to the default.
pub fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new(VERBOSE_DIRECTIVES);
    }

    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Resolves when the process receives Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directives(filter: EnvFilter) -> String {
        filter.to_string().to_lowercase()
    }

    #[test]
    fn verbose_overrides_rust_log() {
        let filter = directives(log_filter(true, Some("warn")));
        assert!(filter.contains("cashflow_gateway=debug"));
        assert!(filter.contains("tower_http=debug"));
    }

    #[test]
    fn rust_log_is_honoured() {
        assert_eq!(directives(log_filter(false, Some("warn"))), "warn");
    }

    #[test]
    fn default_and_invalid_fall_back_to_info() {
        assert_eq!(directives(log_filter(false, None)), "info");
        assert_eq!(directives(log_filter(false, Some("cashflow_gateway=loud"))), "info");
    }
}
