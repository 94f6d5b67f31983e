//! Rows of the `accounts` and `actual_transactions` tables.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Origin tag written on every synced transaction.
pub const PLAID_SOURCE: &str = "plaid";

/// Store-assigned account id, either a bigint or a uuid/text key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountId {
    /// Integer primary key.
    Int(i64),
    /// Text or uuid primary key.
    Text(String),
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for AccountId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

/// A linked provider item owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Store id.
    pub id: AccountId,
    /// Owning user.
    pub user_id: String,
    /// Provider access token.
    pub plaid_id: String,
    /// Last synced current balance, a JSON number on the wire.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub balance: Option<Decimal>,
}

/// Account row to insert after a token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAccount {
    /// Owning user.
    pub user_id: String,
    /// Provider access token.
    pub plaid_id: String,
}

/// Row of `actual_transactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Owning user.
    pub user_id: String,
    /// Owning account.
    pub account_id: AccountId,
    /// Provider transaction name.
    pub description: String,
    /// Amount as reported by the provider.
    pub amount: Decimal,
    /// Posting date.
    pub date: NaiveDate,
    /// Origin tag.
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_accepts_numbers_and_strings() {
        let int: AccountId = serde_json::from_str("42").unwrap();
        let text: AccountId =
            serde_json::from_str("\"5f0c6a3e-8d8b-4a51-9b1e-2f0d4c0b9e11\"").unwrap();

        assert_eq!(int, AccountId::Int(42));
        assert_eq!(int.to_string(), "42");
        assert_eq!(text.to_string(), "5f0c6a3e-8d8b-4a51-9b1e-2f0d4c0b9e11");
    }

    #[test]
    fn account_row_without_balance() {
        let account: Account = serde_json::from_value(serde_json::json!({
            "id": 7,
            "user_id": "u1",
            "plaid_id": "at-1",
            "balance": null
        }))
        .unwrap();

        assert_eq!(account.id, AccountId::Int(7));
        assert_eq!(account.balance, None);
    }

    #[test]
    fn account_balance_is_a_json_number() {
        let account = Account {
            id: AccountId::Int(7),
            user_id: "u1".to_string(),
            plaid_id: "at-1".to_string(),
            balance: Some(rust_decimal_macros::dec!(50.10)),
        };

        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(value["balance"], serde_json::json!(50.1));

        let parsed: Account = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.balance, Some(rust_decimal_macros::dec!(50.1)));
    }
}
