use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub source_item_id: String,
    pub name: String,
    pub official_name: Option<String>,
    #[serde(rename = "type")]
    pub account_type: String,
    pub subtype: Option<String>,
    pub mask: Option<String>,
    pub current_balance: Option<f64>,
    pub available_balance: Option<f64>,
    pub currency_code: Option<String>,
    /// Set by the store on every write.
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub account_id: String,
    /// Positive = money out, negative = money in.
    pub amount: f64,
    pub currency_code: Option<String>,
    pub date: String,
    pub authorized_date: Option<String>,
    pub name: String,
    pub merchant_name: Option<String>,
    pub pending: bool,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub payment_channel: Option<String>,
    pub transaction_type: Option<String>,
    pub tag: Option<String>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.amount < 0.0
    }

    pub fn display_name(&self) -> &str {
        self.merchant_name.as_deref().unwrap_or(&self.name)
    }

    /// Tag if set, else upstream category, else "uncategorized".
    pub fn resolved_tag(&self) -> &str {
        self.tag
            .as_deref()
            .or(self.category.as_deref())
            .unwrap_or(UNCATEGORIZED)
    }

    /// Text the tag rules and grep patterns are matched against.
    pub fn match_haystack(&self) -> String {
        haystack(self.merchant_name.as_deref(), Some(self.name.as_str()))
    }
}

pub const UNCATEGORIZED: &str = "uncategorized";

/// Space-join the present fields, skipping absent or empty ones.
pub fn haystack(merchant_name: Option<&str>, name: Option<&str>) -> String {
    [merchant_name, name]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub item_id: String,
    pub cursor: String,
    pub last_synced_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRule {
    pub id: i64,
    pub pattern: String,
    pub tag: String,
    pub priority: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub tag: String,
    pub monthly_limit: f64,
    pub alert_threshold: f64,
}

pub const DEFAULT_ALERT_THRESHOLD: f64 = 0.9;

/// Combinable filters for transaction listing. Every bound is inclusive.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub account_id: Option<String>,
    pub pending: Option<bool>,
    /// Matches `tag`, or `category` when the tag is unset.
    pub tag: Option<String>,
    pub limit: Option<usize>,
}

#[cfg(test)]
pub(crate) fn sample_transaction(id: &str, account_id: &str, date: &str, amount: f64) -> Transaction {
    Transaction {
        transaction_id: id.to_string(),
        account_id: account_id.to_string(),
        amount,
        currency_code: Some("USD".to_string()),
        date: date.to_string(),
        authorized_date: None,
        name: format!("Transaction {id}"),
        merchant_name: None,
        pending: false,
        category: None,
        subcategory: None,
        payment_channel: Some("online".to_string()),
        transaction_type: None,
        tag: None,
    }
}

#[cfg(test)]
pub(crate) fn sample_account(id: &str, item_id: &str) -> Account {
    Account {
        account_id: id.to_string(),
        source_item_id: item_id.to_string(),
        name: format!("Account {id}"),
        official_name: None,
        account_type: "depository".to_string(),
        subtype: Some("checking".to_string()),
        mask: Some("0000".to_string()),
        current_balance: Some(1000.0),
        available_balance: Some(900.0),
        currency_code: Some("USD".to_string()),
        updated_at: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_convention() {
        let income = sample_transaction("t1", "a1", "2024-01-01", -1500.0);
        let spend = sample_transaction("t2", "a1", "2024-01-01", 25.0);
        assert!(income.is_income());
        assert!(!spend.is_income());
    }

    #[test]
    fn test_display_name_fallback() {
        let mut txn = sample_transaction("t1", "a1", "2024-01-01", 4.5);
        txn.name = "SQ *STARBUCKS 1234".to_string();
        txn.merchant_name = Some("Starbucks".to_string());
        assert_eq!(txn.display_name(), "Starbucks");

        txn.merchant_name = None;
        txn.name = "Direct Deposit".to_string();
        assert_eq!(txn.display_name(), "Direct Deposit");
    }

    #[test]
    fn test_resolved_tag() {
        let mut txn = sample_transaction("t1", "a1", "2024-01-01", 10.0);
        assert_eq!(txn.resolved_tag(), "uncategorized");
        txn.category = Some("FOOD_AND_DRINK".to_string());
        assert_eq!(txn.resolved_tag(), "FOOD_AND_DRINK");
        txn.tag = Some("coffee".to_string());
        assert_eq!(txn.resolved_tag(), "coffee");
    }

    #[test]
    fn test_haystack_skips_missing_fields() {
        assert_eq!(haystack(Some("Starbucks"), Some("Starbucks Coffee")), "Starbucks Starbucks Coffee");
        assert_eq!(haystack(None, Some("Payroll")), "Payroll");
        assert_eq!(haystack(Some(""), Some("Payroll")), "Payroll");
    }
}
