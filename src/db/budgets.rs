use rusqlite::params;

use super::Ledger;
use crate::error::{Result, TallyError};
use crate::models::Budget;

impl Ledger {
    /// One budget per tag; setting it again replaces limit and threshold.
    pub fn upsert_budget(&mut self, tag: &str, monthly_limit: f64, alert_threshold: f64) -> Result<()> {
        if !monthly_limit.is_finite() || monthly_limit < 0.0 {
            return Err(TallyError::config("monthly limit must be a non-negative number"));
        }
        if !(0.0..=1.0).contains(&alert_threshold) {
            return Err(TallyError::config("alert threshold must be between 0 and 1"));
        }
        self.conn.execute(
            "INSERT INTO budgets (tag, monthly_limit, alert_threshold) VALUES (?1, ?2, ?3) \
             ON CONFLICT(tag) DO UPDATE SET monthly_limit = excluded.monthly_limit, \
             alert_threshold = excluded.alert_threshold",
            params![tag, monthly_limit, alert_threshold],
        )?;
        Ok(())
    }

    pub fn list_budgets(&self) -> Result<Vec<Budget>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag, monthly_limit, alert_threshold FROM budgets ORDER BY tag")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Budget {
                    tag: row.get(0)?,
                    monthly_limit: row.get(1)?,
                    alert_threshold: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn delete_budget(&mut self, tag: &str) -> Result<bool> {
        Ok(self.conn.execute("DELETE FROM budgets WHERE tag = ?1", [tag])? > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Ledger;

    #[test]
    fn test_budget_upsert_by_tag() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        ledger.upsert_budget("groceries", 400.0, 0.9).unwrap();
        ledger.upsert_budget("groceries", 500.0, 0.8).unwrap();
        ledger.upsert_budget("coffee", 50.0, 0.9).unwrap();

        let budgets = ledger.list_budgets().unwrap();
        assert_eq!(budgets.len(), 2);
        assert_eq!(budgets[0].tag, "coffee");
        assert_eq!(budgets[1].monthly_limit, 500.0);
        assert_eq!(budgets[1].alert_threshold, 0.8);
    }

    #[test]
    fn test_budget_validation() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        assert!(ledger.upsert_budget("x", -1.0, 0.9).is_err());
        assert!(ledger.upsert_budget("x", 10.0, 1.5).is_err());
        assert!(ledger.upsert_budget("x", f64::NAN, 0.9).is_err());
        assert!(ledger.upsert_budget("x", f64::INFINITY, 0.9).is_err());
        assert!(ledger.upsert_budget("x", 10.0, f64::NAN).is_err());
        assert!(ledger.list_budgets().unwrap().is_empty());
    }

    #[test]
    fn test_delete_budget() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        ledger.upsert_budget("coffee", 50.0, 0.9).unwrap();
        assert!(ledger.delete_budget("coffee").unwrap());
        assert!(!ledger.delete_budget("coffee").unwrap());
    }
}
