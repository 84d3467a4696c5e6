use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{placeholders, Ledger};
use crate::error::{Result, TallyError};
use crate::models::{Transaction, TransactionFilter};

pub(super) const TRANSACTION_COLUMNS: &str = "t.transaction_id, t.account_id, t.amount, \
     t.currency_code, t.date, t.authorized_date, t.name, t.merchant_name, t.pending, \
     t.category, t.subcategory, t.payment_channel, t.transaction_type, t.tag";

pub(super) fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        transaction_id: row.get(0)?,
        account_id: row.get(1)?,
        amount: row.get(2)?,
        currency_code: row.get(3)?,
        date: row.get(4)?,
        authorized_date: row.get(5)?,
        name: row.get(6)?,
        merchant_name: row.get(7)?,
        pending: row.get::<_, i64>(8)? != 0,
        category: row.get(9)?,
        subcategory: row.get(10)?,
        payment_channel: row.get(11)?,
        transaction_type: row.get(12)?,
        tag: row.get(13)?,
    })
}

/// Upsert by `transaction_id`. An incoming null tag keeps the stored one.
pub(super) fn upsert_transactions_in(conn: &Connection, txns: &[Transaction]) -> Result<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO transactions (transaction_id, account_id, amount, currency_code, date, \
         authorized_date, name, merchant_name, pending, category, subcategory, \
         payment_channel, transaction_type, tag) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14) \
         ON CONFLICT(transaction_id) DO UPDATE SET \
         account_id = excluded.account_id, amount = excluded.amount, \
         currency_code = excluded.currency_code, date = excluded.date, \
         authorized_date = excluded.authorized_date, name = excluded.name, \
         merchant_name = excluded.merchant_name, pending = excluded.pending, \
         category = excluded.category, subcategory = excluded.subcategory, \
         payment_channel = excluded.payment_channel, \
         transaction_type = excluded.transaction_type, \
         tag = COALESCE(excluded.tag, transactions.tag)",
    )?;
    for t in txns {
        stmt.execute(params![
            t.transaction_id,
            t.account_id,
            t.amount,
            t.currency_code,
            t.date,
            t.authorized_date,
            t.name,
            t.merchant_name,
            t.pending as i32,
            t.category,
            t.subcategory,
            t.payment_channel,
            t.transaction_type,
            t.tag,
        ])?;
    }
    Ok(txns.len())
}

pub(super) fn remove_transactions_in(conn: &Connection, ids: &[String]) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut removed = 0usize;
    // Stay well below SQLite's bound-parameter limit.
    for chunk in ids.chunks(500) {
        let sql = format!(
            "DELETE FROM transactions WHERE transaction_id IN ({})",
            placeholders(1, chunk.len())
        );
        removed += conn.execute(&sql, rusqlite::params_from_iter(chunk.iter()))?;
    }
    Ok(removed)
}

pub(super) fn remove_transactions_by_account_in(
    conn: &Connection,
    account_ids: &[String],
) -> Result<usize> {
    if account_ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "DELETE FROM transactions WHERE account_id IN ({})",
        placeholders(1, account_ids.len())
    );
    Ok(conn.execute(&sql, rusqlite::params_from_iter(account_ids.iter()))?)
}

/// Build the WHERE clause and parameters for a filter. Returns an empty
/// clause when no filter is set.
fn filter_clause(filter: &TransactionFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    let mut push = |cond: &str, value: Box<dyn ToSql>| {
        values.push(value);
        conditions.push(cond.replace("?", &format!("?{}", values.len())));
    };

    if let Some(from) = &filter.from_date {
        push("t.date >= ?", Box::new(from.clone()));
    }
    if let Some(to) = &filter.to_date {
        push("t.date <= ?", Box::new(to.clone()));
    }
    if let Some(min) = filter.min_amount {
        push("t.amount >= ?", Box::new(min));
    }
    if let Some(max) = filter.max_amount {
        push("t.amount <= ?", Box::new(max));
    }
    if let Some(account_id) = &filter.account_id {
        push("t.account_id = ?", Box::new(account_id.clone()));
    }
    if let Some(pending) = filter.pending {
        push("t.pending = ?", Box::new(pending as i32));
    }
    if let Some(tag) = &filter.tag {
        push("COALESCE(t.tag, t.category) = ?", Box::new(tag.clone()));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

impl Ledger {
    pub fn upsert_transactions(&mut self, txns: &[Transaction]) -> Result<usize> {
        if txns.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let n = upsert_transactions_in(&tx, txns)?;
        tx.commit()?;
        Ok(n)
    }

    #[cfg(test)]
    pub fn remove_transactions(&mut self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let n = remove_transactions_in(&tx, ids)?;
        tx.commit()?;
        Ok(n)
    }

    #[cfg(test)]
    pub fn remove_transactions_by_account(&mut self, account_ids: &[String]) -> Result<usize> {
        if account_ids.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let n = remove_transactions_by_account_in(&tx, account_ids)?;
        tx.commit()?;
        Ok(n)
    }

    /// Filtered listing, newest first.
    pub fn get_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let (clause, values) = filter_clause(filter);
        let limit = filter
            .limit
            .map(|n| format!(" LIMIT {n}"))
            .unwrap_or_default();
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions t{clause} \
             ORDER BY t.date DESC, t.transaction_id{limit}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let param_values: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let rows = stmt
            .query_map(param_values.as_slice(), row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_transaction(&self, transaction_id: &str) -> Result<Option<Transaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions t WHERE t.transaction_id = ?1");
        Ok(self
            .conn
            .query_row(&sql, [transaction_id], row_to_transaction)
            .optional()?)
    }

    #[cfg(test)]
    pub fn count_transactions(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?)
    }

    pub fn untagged_transactions(&self) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions t WHERE t.tag IS NULL ORDER BY t.date DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Manual tag edit. Unlike rule tagging this may overwrite or clear a tag.
    pub fn set_transaction_tag(&mut self, transaction_id: &str, tag: Option<&str>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE transactions SET tag = ?1 WHERE transaction_id = ?2",
            params![tag, transaction_id],
        )?;
        if changed == 0 {
            return Err(TallyError::config(format!(
                "no transaction with id {transaction_id}"
            )));
        }
        Ok(())
    }

    /// Write tags for many transactions in one unit. Rows whose tag is
    /// already set are left alone.
    pub fn apply_tags(&mut self, assignments: &[(String, String)]) -> Result<usize> {
        if assignments.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut tagged = 0usize;
        {
            let mut stmt = tx.prepare_cached(
                "UPDATE transactions SET tag = ?1 WHERE transaction_id = ?2 AND tag IS NULL",
            )?;
            for (transaction_id, tag) in assignments {
                tagged += stmt.execute(params![tag, transaction_id])?;
            }
        }
        tx.commit()?;
        Ok(tagged)
    }

    /// Ranked full-text match. `match_expr` is an FTS5 query string.
    pub fn search_fts(&self, match_expr: &str, limit: usize) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions_fts \
             JOIN transactions t ON t.rowid = transactions_fts.rowid \
             WHERE transactions_fts MATCH ?1 \
             ORDER BY bm25(transactions_fts), t.date DESC \
             LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![match_expr, limit as i64], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
