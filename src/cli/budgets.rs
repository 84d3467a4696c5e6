use comfy_table::{Cell, Table};

use super::{emit, open_ledger, tables, Output};
use crate::budgets::{check_alerts, get_budget_statuses};
use crate::dates::{current_month, validate_month};
use crate::error::{Result, TallyError};
use crate::fmt::money;
use crate::models::Budget;
use crate::responses::BudgetsResponse;

pub fn set(tag: &str, limit: f64, threshold: f64) -> Result<()> {
    let mut ledger = open_ledger()?;
    ledger.upsert_budget(tag, limit, threshold)?;
    eprintln!("Budget for {tag}: {} / month", money(limit));
    Ok(())
}

pub fn list(output: Output) -> Result<()> {
    let ledger = open_ledger()?;
    let budgets: Vec<Budget> = ledger.list_budgets()?;
    emit(output, &budgets, |rows| {
        let mut table = Table::new();
        table.set_header(vec!["Tag", "Monthly Limit", "Alert At"]);
        for b in rows {
            table.add_row(vec![
                Cell::new(&b.tag),
                Cell::new(money(b.monthly_limit)),
                Cell::new(format!("{:.0}%", b.alert_threshold * 100.0)),
            ]);
        }
        table
    })
}

pub fn delete(tag: &str) -> Result<()> {
    let mut ledger = open_ledger()?;
    if !ledger.delete_budget(tag)? {
        return Err(TallyError::config(format!("no budget for '{tag}'")));
    }
    eprintln!("Deleted budget for {tag}");
    Ok(())
}

fn resolve_month(month: Option<String>) -> Result<String> {
    match month {
        Some(m) => {
            validate_month(&m)?;
            Ok(m)
        }
        None => Ok(current_month()),
    }
}

pub fn status(month: Option<String>, output: Output) -> Result<()> {
    let month = resolve_month(month)?;
    let ledger = open_ledger()?;
    let resp = BudgetsResponse {
        budgets: get_budget_statuses(&ledger, Some(&month))?,
        month,
    };
    emit(output, &resp, |r| tables::budget_statuses(&r.budgets))
}

pub fn alerts(month: Option<String>, output: Output) -> Result<()> {
    let month = resolve_month(month)?;
    let ledger = open_ledger()?;
    let resp = BudgetsResponse {
        budgets: check_alerts(&ledger, Some(&month))?,
        month,
    };
    emit(output, &resp, |r| tables::budget_statuses(&r.budgets))
}
