//! Serializable report shapes handed to the CLI.

use serde::Serialize;

use crate::budgets::BudgetStatus;
use crate::models::{Account, TagRule, Transaction};

/// A transaction plus its derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub is_income: bool,
    pub display_name: String,
}

impl From<Transaction> for TransactionView {
    fn from(transaction: Transaction) -> Self {
        Self {
            is_income: transaction.is_income(),
            display_name: transaction.display_name().to_string(),
            transaction,
        }
    }
}

pub fn views(txns: Vec<Transaction>) -> Vec<TransactionView> {
    txns.into_iter().map(TransactionView::from).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountsResponse {
    pub accounts: Vec<Account>,
    pub total_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionView>,
    pub count: usize,
}

impl TransactionsResponse {
    pub fn new(txns: Vec<Transaction>) -> Self {
        let transactions = views(txns);
        Self {
            count: transactions.len(),
            transactions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncResponse {
    pub item_id: String,
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub accounts: usize,
    pub cursor: String,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnlinkResponse {
    pub item_id: String,
    pub transactions_removed: usize,
    pub accounts_removed: usize,
    pub sync_state_removed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub transactions: Vec<TransactionView>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GrepResponse {
    pub pattern: String,
    pub transactions: Vec<TransactionView>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagRulesResponse {
    pub rules: Vec<TagRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitCategory {
    pub tag: String,
    pub total: f64,
    pub count: i64,
    /// Fraction of the period's total spend.
    pub share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitResponse {
    pub categories: Vec<SplitCategory>,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetsResponse {
    pub month: String,
    pub budgets: Vec<BudgetStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub month: String,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BurnResponse {
    pub months: Vec<MonthTotal>,
    pub total: f64,
    pub average_monthly_burn: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetMonth {
    pub month: String,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetResponse {
    pub months: Vec<NetMonth>,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResponse {
    pub generated_at: String,
    pub last_synced_at: String,
    pub accounts: Vec<Account>,
    pub total_balance: f64,
    pub recent_transactions: Vec<TransactionView>,
    pub budgets: Vec<BudgetStatus>,
    pub alerts: Vec<BudgetStatus>,
    pub burn: BurnResponse,
    pub runway_months: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_transaction;

    #[test]
    fn test_transaction_view_serializes_derived_fields() {
        let mut txn = sample_transaction("t1", "a1", "2024-01-01", -1500.0);
        txn.name = "Direct Deposit".to_string();
        let json = serde_json::to_value(TransactionView::from(txn)).unwrap();
        assert_eq!(json["transaction_id"], "t1");
        assert_eq!(json["is_income"], true);
        assert_eq!(json["display_name"], "Direct Deposit");
        assert!(json["tag"].is_null());
    }

    #[test]
    fn test_trend_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Trend::Increasing).unwrap(), "\"increasing\"");
    }
}
