use serde::Serialize;

use crate::dates::{current_month, validate_month};
use crate::db::Ledger;
use crate::error::Result;
use crate::fmt::{round_cents, round_to};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub tag: String,
    pub monthly_limit: f64,
    pub spent: f64,
    pub remaining: f64,
    pub percent_used: f64,
    pub over_budget: bool,
    pub alert_threshold: f64,
}

pub fn budget_status(tag: &str, monthly_limit: f64, alert_threshold: f64, spent: f64) -> BudgetStatus {
    let percent_used = if monthly_limit == 0.0 {
        0.0
    } else {
        spent / monthly_limit
    };
    BudgetStatus {
        tag: tag.to_string(),
        monthly_limit,
        spent: round_cents(spent),
        remaining: round_cents((monthly_limit - spent).max(0.0)),
        percent_used: round_to(percent_used, 3),
        over_budget: spent > monthly_limit,
        alert_threshold,
    }
}

/// Status of every budget for `month` (default: current month).
pub fn get_budget_statuses(ledger: &Ledger, month: Option<&str>) -> Result<Vec<BudgetStatus>> {
    let month = match month {
        Some(m) => {
            validate_month(m)?;
            m.to_string()
        }
        None => current_month(),
    };
    let spend = ledger.spend_by_tag_for_month(&month)?;
    let statuses = ledger
        .list_budgets()?
        .into_iter()
        .map(|b| {
            let spent = spend.get(&b.tag).copied().unwrap_or(0.0);
            budget_status(&b.tag, b.monthly_limit, b.alert_threshold, spent)
        })
        .collect();
    Ok(statuses)
}

/// Budgets whose usage has reached their alert threshold.
pub fn check_alerts(ledger: &Ledger, month: Option<&str>) -> Result<Vec<BudgetStatus>> {
    Ok(get_budget_statuses(ledger, month)?
        .into_iter()
        .filter(|s| s.percent_used >= s.alert_threshold)
        .collect())
}
