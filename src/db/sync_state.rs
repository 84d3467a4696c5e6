use rusqlite::{params, Connection, OptionalExtension};

use super::accounts::remove_accounts_in;
use super::transactions::{
    remove_transactions_by_account_in, remove_transactions_in, upsert_transactions_in,
};
use super::{now_timestamp, Ledger};
use crate::error::Result;
use crate::models::{SyncState, Transaction};

/// Counts written by one reconciliation commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitCounts {
    pub upserted: usize,
    pub removed: usize,
}

/// Rows deleted by an unlink cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnlinkCounts {
    pub transactions: usize,
    pub accounts: usize,
    pub sync_states: usize,
}

fn set_sync_state_in(conn: &Connection, item_id: &str, cursor: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO sync_state (item_id, cursor, last_synced_at) VALUES (?1, ?2, ?3) \
         ON CONFLICT(item_id) DO UPDATE SET cursor = excluded.cursor, \
         last_synced_at = excluded.last_synced_at",
        params![item_id, cursor, now_timestamp()],
    )?;
    Ok(())
}

impl Ledger {
    pub fn get_sync_state(&self, item_id: &str) -> Result<Option<SyncState>> {
        Ok(self
            .conn
            .query_row(
                "SELECT item_id, cursor, last_synced_at FROM sync_state WHERE item_id = ?1",
                [item_id],
                |row| {
                    Ok(SyncState {
                        item_id: row.get(0)?,
                        cursor: row.get(1)?,
                        last_synced_at: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    #[cfg(test)]
    pub fn set_sync_state(&mut self, item_id: &str, cursor: &str) -> Result<()> {
        set_sync_state_in(&self.conn, item_id, cursor)
    }

    pub fn list_sync_states(&self) -> Result<Vec<SyncState>> {
        let mut stmt = self
            .conn
            .prepare("SELECT item_id, cursor, last_synced_at FROM sync_state ORDER BY item_id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SyncState {
                    item_id: row.get(0)?,
                    cursor: row.get(1)?,
                    last_synced_at: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Most recent sync across all items, if any item has synced.
    pub fn last_synced_at(&self) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT MAX(last_synced_at) FROM sync_state", [], |r| r.get(0))?)
    }

    /// Forget the cursor so the next pass starts from the beginning.
    pub fn delete_sync_state(&mut self, item_id: &str) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM sync_state WHERE item_id = ?1", [item_id])?)
    }

    /// Land a reconciliation pass: upsert the changed transactions, drop the
    /// removed ones, and advance the cursor, all in one SQLite transaction.
    pub fn commit_sync(
        &mut self,
        item_id: &str,
        changed: &[Transaction],
        removed_ids: &[String],
        cursor: &str,
    ) -> Result<CommitCounts> {
        let tx = self.conn.transaction()?;
        let upserted = upsert_transactions_in(&tx, changed)?;
        let removed = remove_transactions_in(&tx, removed_ids)?;
        set_sync_state_in(&tx, item_id, cursor)?;
        tx.commit()?;
        Ok(CommitCounts { upserted, removed })
    }

    /// Remove every trace of an item: its transactions, then its accounts,
    /// then its cursor.
    pub fn unlink_item(&mut self, item_id: &str) -> Result<UnlinkCounts> {
        let account_ids: Vec<String> = self
            .accounts_for_item(item_id)?
            .into_iter()
            .map(|a| a.account_id)
            .collect();
        let tx = self.conn.transaction()?;
        let transactions = remove_transactions_by_account_in(&tx, &account_ids)?;
        let accounts = remove_accounts_in(&tx, &account_ids)?;
        let sync_states = tx.execute("DELETE FROM sync_state WHERE item_id = ?1", [item_id])?;
        tx.commit()?;
        Ok(UnlinkCounts {
            transactions,
            accounts,
            sync_states,
        })
    }
}
