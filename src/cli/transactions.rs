use super::{emit, open_ledger, tables, FilterArgs, Output};
use crate::dates::validate_filter;
use crate::error::Result;
use crate::models::TransactionFilter;
use crate::responses::{views, GrepResponse, SearchResponse, TransactionView, TransactionsResponse};
use crate::search::{grep_transactions, search_transactions};

pub fn list(filter: FilterArgs, output: Output) -> Result<()> {
    let filter = TransactionFilter::from(filter);
    validate_filter(&filter)?;
    let ledger = open_ledger()?;
    let resp = TransactionsResponse::new(ledger.get_transactions(&filter)?);
    emit(output, &resp, |r| tables::transactions(&r.transactions))
}

pub fn search(terms: &[String], limit: usize, output: Output) -> Result<()> {
    let query = terms.join(" ");
    let ledger = open_ledger()?;
    let transactions = views(search_transactions(&ledger, &query, limit)?);
    let resp = SearchResponse {
        count: transactions.len(),
        query,
        transactions,
    };
    emit(output, &resp, |r| tables::transactions(&r.transactions))
}

pub fn grep(pattern: &str, filter: FilterArgs, output: Output) -> Result<()> {
    let ledger = open_ledger()?;
    let transactions = views(grep_transactions(&ledger, pattern, &filter.into())?);
    let resp = GrepResponse {
        count: transactions.len(),
        pattern: pattern.to_string(),
        transactions,
    };
    emit(output, &resp, |r| tables::transactions(&r.transactions))
}

/// Manual tag edit; overrides whatever a rule assigned.
pub fn tag(transaction_id: &str, tag: Option<&str>, output: Output) -> Result<()> {
    let mut ledger = open_ledger()?;
    ledger.set_transaction_tag(transaction_id, tag)?;
    let updated = ledger.get_transaction(transaction_id)?;
    let resp: Vec<TransactionView> = updated.into_iter().map(TransactionView::from).collect();
    emit(output, &resp, |r| tables::transactions(r))
}
