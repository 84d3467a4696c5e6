//! Upstream aggregation feed.
//!
//! The reconciler only sees [`TransactionFeed`]. [`PlaidClient`] is the HTTP
//! implementation of the incremental `/transactions/sync` endpoint; response
//! records are parsed into strict structs here so nothing loosely typed
//! crosses into the ledger.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TallyError};

/// Page size requested from the sync endpoint.
const PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct FeedBalances {
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub available: Option<f64>,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedAccount {
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub official_name: Option<String>,
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub mask: Option<String>,
    pub balances: FeedBalances,
}

/// Richer two-level classification, preferred over the legacy list.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonalFinanceCategory {
    pub primary: String,
    #[serde(default)]
    pub detailed: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedTransaction {
    pub transaction_id: String,
    pub account_id: String,
    pub amount: f64,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
    pub date: String,
    #[serde(default)]
    pub authorized_date: Option<String>,
    pub name: String,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub personal_finance_category: Option<PersonalFinanceCategory>,
    /// Legacy hierarchy, broadest first.
    #[serde(default)]
    pub category: Option<Vec<String>>,
    #[serde(default)]
    pub payment_channel: Option<String>,
    #[serde(default)]
    pub transaction_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemovedTransaction {
    pub transaction_id: String,
}

/// One page of changes since a cursor.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncPage {
    #[serde(default)]
    pub added: Vec<FeedTransaction>,
    #[serde(default)]
    pub modified: Vec<FeedTransaction>,
    #[serde(default)]
    pub removed: Vec<RemovedTransaction>,
    #[serde(default)]
    pub accounts: Vec<FeedAccount>,
    pub next_cursor: String,
    pub has_more: bool,
}

/// Source of incremental transaction deltas for a linked item.
pub trait TransactionFeed {
    /// Fetch the next page after `cursor`. An empty cursor starts from scratch.
    fn sync_page(&self, access_token: &str, cursor: &str) -> Result<SyncPage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Development,
    Production,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox.plaid.com",
            Self::Development => "https://development.plaid.com",
            Self::Production => "https://production.plaid.com",
        }
    }
}

#[derive(Serialize)]
struct SyncRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
    count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    display_message: Option<String>,
}

/// Blocking client for the aggregation API.
#[derive(Debug)]
pub struct PlaidClient {
    client: Client,
    base_url: String,
    client_id: String,
    secret: String,
}

impl PlaidClient {
    pub fn new(base_url: &str, client_id: &str, secret: &str) -> Result<Self> {
        if client_id.is_empty() || secret.is_empty() {
            return Err(TallyError::config(
                "aggregation credentials are not set up; run `tally init`",
            ));
        }
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            secret: secret.to_string(),
        })
    }
}

impl TransactionFeed for PlaidClient {
    fn sync_page(&self, access_token: &str, cursor: &str) -> Result<SyncPage> {
        let body = SyncRequest {
            client_id: &self.client_id,
            secret: &self.secret,
            access_token,
            cursor: (!cursor.is_empty()).then_some(cursor),
            count: PAGE_SIZE,
        };
        let url = format!("{}/transactions/sync", self.base_url);
        debug!(%url, has_cursor = !cursor.is_empty(), "requesting sync page");
        let response = self.client.post(&url).json(&body).send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(parse_api_error(status.as_u16(), &text));
        }
        serde_json::from_str(&text)
            .map_err(|e| TallyError::upstream(format!("malformed sync response: {e}"), None))
    }
}

fn parse_api_error(status: u16, body: &str) -> TallyError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => {
            let message = err
                .error_message
                .or(err.display_message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            TallyError::upstream(message, err.error_code)
        }
        Err(_) => TallyError::upstream(format!("HTTP {status}: {body}"), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sync_page() {
        let json = r#"{
            "added": [{
                "transaction_id": "tx1",
                "account_id": "acc1",
                "amount": 4.33,
                "iso_currency_code": "USD",
                "date": "2024-03-01",
                "authorized_date": null,
                "name": "STARBUCKS 1234",
                "merchant_name": "Starbucks",
                "pending": false,
                "personal_finance_category": {"primary": "FOOD_AND_DRINK", "detailed": "FOOD_AND_DRINK_COFFEE"},
                "category": ["Food and Drink", "Restaurants", "Coffee Shop"],
                "payment_channel": "in store",
                "transaction_type": "place"
            }],
            "modified": [],
            "removed": [{"transaction_id": "gone"}],
            "accounts": [{
                "account_id": "acc1",
                "name": "Checking",
                "official_name": null,
                "type": "depository",
                "subtype": "checking",
                "mask": "0000",
                "balances": {"current": 110.0, "available": 100.0, "iso_currency_code": "USD"}
            }],
            "next_cursor": "abc",
            "has_more": false
        }"#;
        let page: SyncPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.added.len(), 1);
        assert_eq!(page.added[0].merchant_name.as_deref(), Some("Starbucks"));
        assert_eq!(
            page.added[0].personal_finance_category.as_ref().unwrap().primary,
            "FOOD_AND_DRINK"
        );
        assert_eq!(page.removed[0].transaction_id, "gone");
        assert_eq!(page.accounts[0].balances.current, Some(110.0));
        assert_eq!(page.next_cursor, "abc");
        assert!(!page.has_more);
    }

    #[test]
    fn test_parse_rejects_missing_cursor() {
        let json = r#"{"added": [], "modified": [], "removed": [], "has_more": false}"#;
        assert!(serde_json::from_str::<SyncPage>(json).is_err());
    }

    #[test]
    fn test_parse_api_error() {
        let body = r#"{"error_type": "ITEM_ERROR", "error_code": "ITEM_LOGIN_REQUIRED", "error_message": "the login details of this item have changed"}"#;
        match parse_api_error(400, body) {
            TallyError::UpstreamApi { message, code } => {
                assert_eq!(code.as_deref(), Some("ITEM_LOGIN_REQUIRED"));
                assert!(message.contains("login details"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        match parse_api_error(502, "<html>bad gateway</html>") {
            TallyError::UpstreamApi { message, code } => {
                assert!(code.is_none());
                assert!(message.starts_with("HTTP 502"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_client_requires_credentials() {
        let err = PlaidClient::new(Environment::Sandbox.base_url(), "", "").unwrap_err();
        assert!(matches!(err, TallyError::Configuration(_)));
    }

    #[test]
    fn test_environment_serde() {
        let env: Environment = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(env, Environment::Production);
        assert_eq!(env.base_url(), "https://production.plaid.com");
    }
}
