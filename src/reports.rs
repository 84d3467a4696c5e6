use chrono::NaiveDate;

use crate::budgets::{check_alerts, get_budget_statuses};
use crate::dates::{month_of, parse_date, today, trailing_window};
use crate::db::{now_timestamp, Ledger};
use crate::error::Result;
use crate::fmt::{round_cents, round_to};
use crate::models::TransactionFilter;
use crate::responses::{
    views, BurnResponse, MonthTotal, NetMonth, NetResponse, SnapshotResponse, SplitCategory,
    SplitResponse, Trend,
};

pub const DEFAULT_MONTHS: u32 = 6;
const RECENT_TRANSACTIONS: usize = 10;
/// Fraction of the trailing average spend a mean delta must exceed to count as a trend.
const TREND_THRESHOLD: f64 = 0.05;

// ---------------------------------------------------------------------------
// Burn
// ---------------------------------------------------------------------------

/// Classify the last three monthly totals. Fewer than three is always stable.
pub fn classify_trend(totals: &[f64]) -> Trend {
    if totals.len() < 3 {
        return Trend::Stable;
    }
    let last = &totals[totals.len() - 3..];
    let avg_delta = ((last[1] - last[0]) + (last[2] - last[1])) / 2.0;
    let avg_spend = last.iter().sum::<f64>() / 3.0;
    let threshold = avg_spend * TREND_THRESHOLD;
    if avg_delta > threshold {
        Trend::Increasing
    } else if avg_delta < -threshold {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

pub fn get_burn_report(ledger: &Ledger, months: u32) -> Result<BurnResponse> {
    get_burn_report_as_of(ledger, months, today())
}

pub fn get_burn_report_as_of(ledger: &Ledger, months: u32, today: NaiveDate) -> Result<BurnResponse> {
    let (since, until) = trailing_window(today, months)?;
    let buckets: Vec<MonthTotal> = ledger
        .monthly_spend(&since, &until)?
        .into_iter()
        .map(|m| MonthTotal {
            month: m.month,
            total: round_cents(m.total),
        })
        .collect();

    let totals: Vec<f64> = buckets.iter().map(|b| b.total).collect();
    let total: f64 = totals.iter().sum();
    let average = if totals.is_empty() {
        0.0
    } else {
        total / totals.len() as f64
    };

    Ok(BurnResponse {
        trend: classify_trend(&totals),
        months: buckets,
        total: round_cents(total),
        average_monthly_burn: round_cents(average),
    })
}

// ---------------------------------------------------------------------------
// Net
// ---------------------------------------------------------------------------

pub fn get_net_report(ledger: &Ledger, months: u32) -> Result<NetResponse> {
    get_net_report_as_of(ledger, months, today())
}

pub fn get_net_report_as_of(ledger: &Ledger, months: u32, today: NaiveDate) -> Result<NetResponse> {
    let (since, until) = trailing_window(today, months)?;
    let months: Vec<NetMonth> = ledger
        .monthly_cashflow(&since, &until)?
        .into_iter()
        .map(|m| NetMonth {
            month: m.month,
            income: round_cents(m.income),
            expenses: round_cents(m.expenses),
            net: round_cents(m.income - m.expenses),
        })
        .collect();

    let total_income: f64 = months.iter().map(|m| m.income).sum();
    let total_expenses: f64 = months.iter().map(|m| m.expenses).sum();
    Ok(NetResponse {
        months,
        total_income: round_cents(total_income),
        total_expenses: round_cents(total_expenses),
        net: round_cents(total_income - total_expenses),
    })
}

// ---------------------------------------------------------------------------
// Spending split
// ---------------------------------------------------------------------------

/// Outflows by resolved tag with each tag's share of the period total.
pub fn get_spending_split(ledger: &Ledger, from: Option<&str>, to: Option<&str>) -> Result<SplitResponse> {
    for raw in [from, to].into_iter().flatten() {
        parse_date(raw)?;
    }
    let rows = ledger.spending_by_tag(from, to)?;
    let total: f64 = rows.iter().map(|r| r.total).sum();
    let categories = rows
        .into_iter()
        .map(|r| SplitCategory {
            share: if total > 0.0 { round_to(r.total / total, 3) } else { 0.0 },
            total: round_cents(r.total),
            count: r.count,
            tag: r.tag,
        })
        .collect();
    Ok(SplitResponse {
        categories,
        total: round_cents(total),
    })
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Months of spending the current balance covers, to one decimal.
pub fn runway_months(total_balance: f64, burn: &BurnResponse) -> Option<f64> {
    if burn.months.is_empty() || burn.average_monthly_burn <= 0.0 {
        return None;
    }
    Some(round_to(total_balance / burn.average_monthly_burn, 1))
}

pub fn get_snapshot(ledger: &Ledger) -> Result<SnapshotResponse> {
    get_snapshot_as_of(ledger, today())
}

pub fn get_snapshot_as_of(ledger: &Ledger, today: NaiveDate) -> Result<SnapshotResponse> {
    let accounts = ledger.list_accounts()?;
    let total_balance = round_cents(accounts.iter().filter_map(|a| a.current_balance).sum());

    let recent = ledger.get_transactions(&TransactionFilter {
        limit: Some(RECENT_TRANSACTIONS),
        ..Default::default()
    })?;

    let month = month_of(today);
    let budgets = get_budget_statuses(ledger, Some(&month))?;
    let alerts = check_alerts(ledger, Some(&month))?;
    let burn = get_burn_report_as_of(ledger, DEFAULT_MONTHS, today)?;
    let runway = runway_months(total_balance, &burn);

    let generated_at = now_timestamp();
    let last_synced_at = ledger
        .last_synced_at()?
        .unwrap_or_else(|| generated_at.clone());

    Ok(SnapshotResponse {
        generated_at,
        last_synced_at,
        accounts,
        total_balance,
        recent_transactions: views(recent),
        budgets,
        alerts,
        burn,
        runway_months: runway,
    })
}
