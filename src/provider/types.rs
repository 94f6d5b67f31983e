//! Plaid request and response payloads.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed Link configuration used for every link token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    /// Name shown to the user in Plaid Link.
    pub client_name: String,
    /// Products to initialize Link with.
    pub products: Vec<String>,
    /// ISO-3166 country codes.
    pub country_codes: Vec<String>,
    /// Link display language.
    pub language: String,
}

impl LinkSettings {
    /// Default products, countries and language with the given client name.
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            products: vec!["auth".to_string(), "transactions".to_string()],
            country_codes: vec!["US".to_string()],
            language: "en".to_string(),
        }
    }
}

/// Link token payload, passed through to the client unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkToken {
    /// Token used to open Plaid Link.
    pub link_token: String,
    /// Expiration timestamp (RFC 3339).
    pub expiration: String,
    /// Plaid request id.
    pub request_id: String,
    /// Any other fields Plaid returns, e.g. `hosted_link_url`.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Result of exchanging a public token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenExchange {
    /// Durable access token for the item.
    pub access_token: String,
    /// Item id.
    pub item_id: String,
    /// Plaid request id.
    #[serde(default)]
    pub request_id: String,
}

/// Account as reported by `/accounts/get`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderAccount {
    /// Plaid account id.
    pub account_id: String,
    /// Account name.
    #[serde(default)]
    pub name: Option<String>,
    /// Balance snapshot.
    #[serde(default)]
    pub balances: AccountBalances,
}

/// Balances of a provider account.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AccountBalances {
    /// Current balance.
    #[serde(default)]
    pub current: Option<Decimal>,
    /// Available balance.
    #[serde(default)]
    pub available: Option<Decimal>,
    /// Currency code.
    #[serde(default)]
    pub iso_currency_code: Option<String>,
}

/// Transaction as reported by `/transactions/get`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderTransaction {
    /// Plaid transaction id.
    pub transaction_id: String,
    /// Plaid account id.
    pub account_id: String,
    /// Merchant or description.
    pub name: String,
    /// Positive for money leaving the account.
    pub amount: Decimal,
    /// Posting date.
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountsGetResponse {
    pub accounts: Vec<ProviderAccount>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionsGetResponse {
    pub transactions: Vec<ProviderTransaction>,
    #[serde(default)]
    pub total_transactions: Option<usize>,
}

/// Error body returned by Plaid on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct PlaidErrorBody {
    #[serde(default)]
    pub error_type: String,
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub error_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn balances_accept_numbers_and_nulls() {
        let account: ProviderAccount = serde_json::from_value(serde_json::json!({
            "account_id": "acc-1",
            "name": "Checking",
            "balances": { "current": 110.25, "available": null, "iso_currency_code": "USD" }
        }))
        .unwrap();

        assert_eq!(account.balances.current, Some(dec!(110.25)));
        assert_eq!(account.balances.available, None);
    }

    #[test]
    fn transaction_parses_plaid_shape() {
        let tx: ProviderTransaction = serde_json::from_value(serde_json::json!({
            "transaction_id": "tx-1",
            "account_id": "acc-1",
            "name": "Coffee",
            "amount": 4.5,
            "date": "2024-03-02",
            "pending": false
        }))
        .unwrap();

        assert_eq!(tx.amount, dec!(4.5));
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn link_token_keeps_unknown_fields() {
        let raw = serde_json::json!({
            "link_token": "link-sandbox-1",
            "expiration": "2024-03-02T12:00:00Z",
            "request_id": "req-1",
            "hosted_link_url": "https://hosted.plaid.com/link/abc"
        });

        let token: LinkToken = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(token.link_token, "link-sandbox-1");
        assert_eq!(serde_json::to_value(&token).unwrap(), raw);
    }

    #[test]
    fn link_settings_defaults() {
        let settings = LinkSettings::new("CashFlowApp");
        assert_eq!(settings.products, vec!["auth", "transactions"]);
        assert_eq!(settings.country_codes, vec!["US"]);
        assert_eq!(settings.language, "en");
    }
}
