//! Application configuration loaded from environment variables.

use serde::Deserialize;
use strum::{AsRefStr, Display, EnumString};
use url::Url;

/// Plaid environment the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlaidEnvironment {
    /// Test data, no real institutions.
    #[default]
    Sandbox,
    /// Live institutions, limited items.
    Development,
    /// Live institutions.
    Production,
}

impl PlaidEnvironment {
    /// Base URL of the Plaid API for this environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox.plaid.com",
            Self::Development => "https://development.plaid.com",
            Self::Production => "https://production.plaid.com",
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Plaid Credentials ===
    /// Plaid client id.
    pub plaid_client_id: String,

    /// Plaid secret for the selected environment.
    pub plaid_secret: String,

    /// Plaid environment.
    #[serde(default)]
    pub plaid_env: PlaidEnvironment,

    /// Explicit API base URL, overrides `plaid_env`.
    #[serde(default)]
    pub plaid_base_url: Option<String>,

    /// Client name shown in Plaid Link.
    #[serde(default = "default_client_name")]
    pub plaid_client_name: String,

    // === Supabase ===
    /// Supabase project URL.
    pub supabase_url: String,

    /// Service-role key, bypasses row level security.
    pub supabase_service_role_key: String,

    // === Server Configuration ===
    /// Listen address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Timeout for outbound HTTP requests in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    // === Metrics ===
    /// Start the Prometheus exporter.
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Prometheus exporter port.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_client_name() -> String {
    "CashFlowApp".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_metrics_port() -> u16 {
    9090
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.plaid_client_id.is_empty() {
            return Err("PLAID_CLIENT_ID is required".to_string());
        }

        if self.plaid_secret.is_empty() {
            return Err("PLAID_SECRET is required".to_string());
        }

        if self.supabase_service_role_key.is_empty() {
            return Err("SUPABASE_SERVICE_ROLE_KEY is required".to_string());
        }

        check_http_url("SUPABASE_URL", &self.supabase_url)?;

        if let Some(base_url) = &self.plaid_base_url {
            check_http_url("PLAID_BASE_URL", base_url)?;
        }

        if self.port == 0 {
            return Err("PORT must be non-zero".to_string());
        }

        Ok(())
    }

    /// Plaid API base URL, honouring the explicit override.
    pub fn plaid_url(&self) -> &str {
        self.plaid_base_url
            .as_deref()
            .unwrap_or_else(|| self.plaid_env.base_url())
    }
}

fn check_http_url(name: &str, value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| format!("{name} is not a valid URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("{name} must use http or https, got {other}")),
    }
}

/// Mask a secret for display, keeping the first four characters.
pub fn mask_secret(secret: &str) -> String {
    if secret.len() <= 4 {
        return "****".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}****")
}
