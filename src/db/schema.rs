use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

/// Forward-only migrations. Entry `i` brings the schema to version `i + 1`.
pub const MIGRATIONS: &[&str] = &[
    // 1: core tables
    "
CREATE TABLE IF NOT EXISTS accounts (
    account_id TEXT PRIMARY KEY,
    source_item_id TEXT NOT NULL,
    name TEXT NOT NULL,
    official_name TEXT,
    type TEXT NOT NULL,
    subtype TEXT,
    mask TEXT,
    current_balance REAL,
    available_balance REAL,
    currency_code TEXT,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    transaction_id TEXT PRIMARY KEY,
    account_id TEXT NOT NULL,
    amount REAL NOT NULL,
    currency_code TEXT,
    date TEXT NOT NULL,
    authorized_date TEXT,
    name TEXT NOT NULL,
    merchant_name TEXT,
    pending INTEGER NOT NULL DEFAULT 0,
    category TEXT,
    subcategory TEXT,
    payment_channel TEXT,
    transaction_type TEXT,
    tag TEXT,
    FOREIGN KEY (account_id) REFERENCES accounts(account_id)
);

CREATE TABLE IF NOT EXISTS sync_state (
    item_id TEXT PRIMARY KEY,
    cursor TEXT NOT NULL DEFAULT '',
    last_synced_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tag_rules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pattern TEXT NOT NULL,
    tag TEXT NOT NULL,
    priority INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS budgets (
    tag TEXT PRIMARY KEY,
    monthly_limit REAL NOT NULL,
    alert_threshold REAL NOT NULL DEFAULT 0.9
);

CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
CREATE INDEX IF NOT EXISTS idx_transactions_tag ON transactions(tag);
CREATE INDEX IF NOT EXISTS idx_accounts_item ON accounts(source_item_id);
",
    // 2: full-text index over name / merchant / category / tag, trigger-maintained
    "
CREATE VIRTUAL TABLE IF NOT EXISTS transactions_fts USING fts5(
    name,
    merchant_name,
    category,
    tag,
    content='transactions',
    content_rowid='rowid'
);

CREATE TRIGGER IF NOT EXISTS transactions_fts_insert AFTER INSERT ON transactions BEGIN
    INSERT INTO transactions_fts(rowid, name, merchant_name, category, tag)
    VALUES (new.rowid, new.name, new.merchant_name, new.category, new.tag);
END;

CREATE TRIGGER IF NOT EXISTS transactions_fts_delete AFTER DELETE ON transactions BEGIN
    INSERT INTO transactions_fts(transactions_fts, rowid, name, merchant_name, category, tag)
    VALUES ('delete', old.rowid, old.name, old.merchant_name, old.category, old.tag);
END;

CREATE TRIGGER IF NOT EXISTS transactions_fts_update AFTER UPDATE ON transactions BEGIN
    INSERT INTO transactions_fts(transactions_fts, rowid, name, merchant_name, category, tag)
    VALUES ('delete', old.rowid, old.name, old.merchant_name, old.category, old.tag);
    INSERT INTO transactions_fts(rowid, name, merchant_name, category, tag)
    VALUES (new.rowid, new.name, new.merchant_name, new.category, new.tag);
END;

INSERT INTO transactions_fts(transactions_fts) VALUES ('rebuild');
",
];

pub fn schema_version(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Apply every migration newer than the stored `user_version`.
/// Each step commits together with its version bump.
pub fn migrate(conn: &mut Connection) -> Result<usize> {
    let current = schema_version(conn)?;
    let mut applied = 0usize;
    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let version = idx as i64 + 1;
        if version <= current {
            continue;
        }
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
        info!(version, "applied ledger migration");
        applied += 1;
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'trigger')")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_migrate_creates_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        let applied = migrate(&mut conn).unwrap();
        assert_eq!(applied, MIGRATIONS.len());
        assert_eq!(schema_version(&conn).unwrap(), MIGRATIONS.len() as i64);

        let names = table_names(&conn);
        for expected in &[
            "accounts",
            "transactions",
            "sync_state",
            "tag_rules",
            "budgets",
            "transactions_fts",
            "transactions_fts_insert",
            "transactions_fts_update",
            "transactions_fts_delete",
        ] {
            assert!(names.contains(&expected.to_string()), "missing: {expected}");
        }
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        assert_eq!(migrate(&mut conn).unwrap(), 0);
    }

    #[test]
    fn test_migrate_applies_only_pending() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MIGRATIONS[0]).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();
        assert_eq!(migrate(&mut conn).unwrap(), MIGRATIONS.len() - 1);
        assert!(table_names(&conn).contains(&"transactions_fts".to_string()));
    }
}
