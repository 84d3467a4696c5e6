//! Ledger store: accounts, transactions, sync cursors, tag rules and budgets
//! in one SQLite file.
//!
//! - `accounts` / `transactions` - upstream data, upserted by the reconciler
//! - `sync_state` - per-item continuation cursors
//! - `tag_rules` / `budgets` - user configuration
//! - `aggregates` - grouped spend / income queries for reports
//!
//! Every multi-row write runs inside a single SQLite transaction. The
//! full-text index is maintained by triggers, so it commits or rolls back
//! with the rows it mirrors.

use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

mod accounts;
mod aggregates;
mod budgets;
pub mod schema;
mod sync_state;
mod tag_rules;
mod transactions;

pub use tag_rules::compile_pattern;

/// Owned handle on the ledger database.
pub struct Ledger {
    conn: Connection,
}

impl Ledger {
    /// Open (creating if needed) the ledger file and bring its schema up to date.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        schema::migrate(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn schema_version(&self) -> Result<i64> {
        schema::schema_version(&self.conn)
    }
}

/// UTC timestamp stored in `updated_at` / `last_synced_at` columns.
pub fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Build `?N, ?N+1, ...` placeholders for an IN list.
pub(crate) fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.db");
        let first = Ledger::open(&path).unwrap();
        let version = first.schema_version().unwrap();
        drop(first);
        let second = Ledger::open(&path).unwrap();
        assert_eq!(second.schema_version().unwrap(), version);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let ledger = Ledger::open_in_memory().unwrap();
        let fk: i64 = ledger
            .conn
            .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1, 3), "?1, ?2, ?3");
        assert_eq!(placeholders(2, 1), "?2");
    }
}
