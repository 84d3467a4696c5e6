use rusqlite::{params, Connection, Row};

use super::{now_timestamp, placeholders, Ledger};
use crate::error::Result;
use crate::models::Account;

const ACCOUNT_COLUMNS: &str = "account_id, source_item_id, name, official_name, type, subtype, \
     mask, current_balance, available_balance, currency_code, updated_at";

fn row_to_account(row: &Row) -> rusqlite::Result<Account> {
    Ok(Account {
        account_id: row.get(0)?,
        source_item_id: row.get(1)?,
        name: row.get(2)?,
        official_name: row.get(3)?,
        account_type: row.get(4)?,
        subtype: row.get(5)?,
        mask: row.get(6)?,
        current_balance: row.get(7)?,
        available_balance: row.get(8)?,
        currency_code: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Insert-or-overwrite every mutable field, bumping `updated_at`.
pub(super) fn upsert_accounts_in(conn: &Connection, accounts: &[Account]) -> Result<usize> {
    let now = now_timestamp();
    let mut stmt = conn.prepare_cached(
        "INSERT INTO accounts (account_id, source_item_id, name, official_name, type, subtype, \
         mask, current_balance, available_balance, currency_code, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
         ON CONFLICT(account_id) DO UPDATE SET \
         source_item_id = excluded.source_item_id, name = excluded.name, \
         official_name = excluded.official_name, type = excluded.type, \
         subtype = excluded.subtype, mask = excluded.mask, \
         current_balance = excluded.current_balance, \
         available_balance = excluded.available_balance, \
         currency_code = excluded.currency_code, updated_at = excluded.updated_at",
    )?;
    for a in accounts {
        stmt.execute(params![
            a.account_id,
            a.source_item_id,
            a.name,
            a.official_name,
            a.account_type,
            a.subtype,
            a.mask,
            a.current_balance,
            a.available_balance,
            a.currency_code,
            now,
        ])?;
    }
    Ok(accounts.len())
}

impl Ledger {
    pub fn upsert_accounts(&mut self, accounts: &[Account]) -> Result<usize> {
        if accounts.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let n = upsert_accounts_in(&tx, accounts)?;
        tx.commit()?;
        Ok(n)
    }

    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY name, account_id"
        ))?;
        let rows = stmt
            .query_map([], row_to_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn accounts_for_item(&self, item_id: &str) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE source_item_id = ?1 ORDER BY name"
        ))?;
        let rows = stmt
            .query_map([item_id], row_to_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Transactions referencing these accounts must be removed first.
    #[cfg(test)]
    pub fn remove_accounts(&mut self, account_ids: &[String]) -> Result<usize> {
        if account_ids.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let n = remove_accounts_in(&tx, account_ids)?;
        tx.commit()?;
        Ok(n)
    }
}

pub(super) fn remove_accounts_in(conn: &Connection, account_ids: &[String]) -> Result<usize> {
    if account_ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "DELETE FROM accounts WHERE account_id IN ({})",
        placeholders(1, account_ids.len())
    );
    Ok(conn.execute(&sql, rusqlite::params_from_iter(account_ids.iter()))?)
}
