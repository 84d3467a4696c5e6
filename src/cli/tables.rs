use comfy_table::{Cell, CellAlignment, Table};

use crate::budgets::BudgetStatus;
use crate::fmt::money;
use crate::models::{Account, TagRule};
use crate::responses::{
    AccountsResponse, BurnResponse, NetResponse, SnapshotResponse, SplitResponse, TransactionView,
};

fn amount(val: f64) -> Cell {
    Cell::new(money(val)).set_alignment(CellAlignment::Right)
}

fn opt_amount(val: Option<f64>) -> Cell {
    match val {
        Some(v) => amount(v),
        None => Cell::new(""),
    }
}

fn percent(val: f64) -> Cell {
    Cell::new(format!("{:.1}%", val * 100.0)).set_alignment(CellAlignment::Right)
}

pub fn accounts(accounts: &[Account]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type", "Mask", "Item", "Current", "Available"]);
    for a in accounts {
        table.add_row(vec![
            Cell::new(&a.account_id),
            Cell::new(&a.name),
            Cell::new(match &a.subtype {
                Some(sub) => format!("{}/{sub}", a.account_type),
                None => a.account_type.clone(),
            }),
            Cell::new(a.mask.as_deref().unwrap_or_default()),
            Cell::new(&a.source_item_id),
            opt_amount(a.current_balance),
            opt_amount(a.available_balance),
        ]);
    }
    table
}

pub fn accounts_response(resp: &AccountsResponse) -> Table {
    let mut table = accounts(&resp.accounts);
    table.add_row(vec![
        Cell::new("Total"),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        amount(resp.total_balance),
        Cell::new(""),
    ]);
    table
}

pub fn transactions(txns: &[TransactionView]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Date", "ID", "Description", "Amount", "Tag", "Pending"]);
    for t in txns {
        table.add_row(vec![
            Cell::new(&t.transaction.date),
            Cell::new(&t.transaction.transaction_id),
            Cell::new(&t.display_name),
            amount(t.transaction.amount),
            Cell::new(t.transaction.resolved_tag()),
            Cell::new(if t.transaction.pending { "yes" } else { "" }),
        ]);
    }
    table
}

pub fn rules(rules: &[TagRule]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Pattern", "Tag", "Priority", "Created"]);
    for r in rules {
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(&r.pattern),
            Cell::new(&r.tag),
            Cell::new(r.priority),
            Cell::new(&r.created_at),
        ]);
    }
    table
}

pub fn budget_statuses(statuses: &[BudgetStatus]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Tag", "Limit", "Spent", "Remaining", "Used", "Status"]);
    for s in statuses {
        let status = if s.over_budget {
            "OVER"
        } else if s.percent_used >= s.alert_threshold {
            "alert"
        } else {
            "ok"
        };
        table.add_row(vec![
            Cell::new(&s.tag),
            amount(s.monthly_limit),
            amount(s.spent),
            amount(s.remaining),
            percent(s.percent_used),
            Cell::new(status),
        ]);
    }
    table
}

pub fn split(resp: &SplitResponse) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Tag", "Count", "Total", "Share"]);
    for c in &resp.categories {
        table.add_row(vec![
            Cell::new(&c.tag),
            Cell::new(c.count),
            amount(c.total),
            percent(c.share),
        ]);
    }
    table.add_row(vec![Cell::new("Total"), Cell::new(""), amount(resp.total), Cell::new("")]);
    table
}

pub fn burn(resp: &BurnResponse) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Month", "Spend"]);
    for m in &resp.months {
        table.add_row(vec![Cell::new(&m.month), amount(m.total)]);
    }
    table.add_row(vec![Cell::new("Average"), amount(resp.average_monthly_burn)]);
    table.add_row(vec![Cell::new("Trend"), Cell::new(resp.trend.as_str())]);
    table
}

pub fn net(resp: &NetResponse) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Month", "Income", "Expenses", "Net"]);
    for m in &resp.months {
        table.add_row(vec![Cell::new(&m.month), amount(m.income), amount(m.expenses), amount(m.net)]);
    }
    table.add_row(vec![
        Cell::new("Total"),
        amount(resp.total_income),
        amount(resp.total_expenses),
        amount(resp.net),
    ]);
    table
}

pub fn snapshot(resp: &SnapshotResponse) -> Table {
    let mut table = Table::new();
    table.add_row(vec![Cell::new("Accounts"), Cell::new(resp.accounts.len())]);
    table.add_row(vec![Cell::new("Total balance"), amount(resp.total_balance)]);
    table.add_row(vec![Cell::new("Average monthly burn"), amount(resp.burn.average_monthly_burn)]);
    table.add_row(vec![
        Cell::new("Runway"),
        Cell::new(match resp.runway_months {
            Some(months) => format!("{months:.1} months"),
            None => "n/a".to_string(),
        }),
    ]);
    table.add_row(vec![Cell::new("Budget alerts"), Cell::new(resp.alerts.len())]);
    table.add_row(vec![Cell::new("Last synced"), Cell::new(&resp.last_synced_at)]);
    table
}
