use std::collections::HashMap;

use rusqlite::params;

use super::Ledger;
use crate::error::Result;

/// Spend for one resolved tag (tag, else category, else "uncategorized").
#[derive(Debug, Clone, PartialEq)]
pub struct TagSpend {
    pub tag: String,
    pub total: f64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySpend {
    pub month: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyCashflow {
    pub month: String,
    /// Absolute value of the inflows.
    pub income: f64,
    pub expenses: f64,
}

const RESOLVED_TAG: &str = "COALESCE(tag, category, 'uncategorized')";

impl Ledger {
    /// Outflows grouped by resolved tag, largest first. Date bounds are inclusive.
    pub fn spending_by_tag(&self, from_date: Option<&str>, to_date: Option<&str>) -> Result<Vec<TagSpend>> {
        let sql = format!(
            "SELECT {RESOLVED_TAG} AS resolved, SUM(amount) AS total, COUNT(*) \
             FROM transactions \
             WHERE amount > 0 \
               AND (?1 IS NULL OR date >= ?1) \
               AND (?2 IS NULL OR date <= ?2) \
             GROUP BY resolved ORDER BY total DESC, resolved"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![from_date, to_date], |row| {
                Ok(TagSpend {
                    tag: row.get(0)?,
                    total: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Outflows per calendar month in `[since, until]`, oldest first.
    /// Months without spending are absent.
    pub fn monthly_spend(&self, since: &str, until: &str) -> Result<Vec<MonthlySpend>> {
        let mut stmt = self.conn.prepare(
            "SELECT substr(date, 1, 7) AS month, SUM(amount) \
             FROM transactions \
             WHERE amount > 0 AND date >= ?1 AND date <= ?2 \
             GROUP BY month ORDER BY month",
        )?;
        let rows = stmt
            .query_map(params![since, until], |row| {
                Ok(MonthlySpend {
                    month: row.get(0)?,
                    total: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Inflow and outflow sums per calendar month in `[since, until]`, oldest first.
    pub fn monthly_cashflow(&self, since: &str, until: &str) -> Result<Vec<MonthlyCashflow>> {
        let mut stmt = self.conn.prepare(
            "SELECT substr(date, 1, 7) AS month, \
             SUM(CASE WHEN amount < 0 THEN -amount ELSE 0 END), \
             SUM(CASE WHEN amount > 0 THEN amount ELSE 0 END) \
             FROM transactions \
             WHERE date >= ?1 AND date <= ?2 \
             GROUP BY month ORDER BY month",
        )?;
        let rows = stmt
            .query_map(params![since, until], |row| {
                Ok(MonthlyCashflow {
                    month: row.get(0)?,
                    income: row.get(1)?,
                    expenses: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Outflows by resolved tag for one `YYYY-MM` month.
    pub fn spend_by_tag_for_month(&self, month: &str) -> Result<HashMap<String, f64>> {
        let sql = format!(
            "SELECT {RESOLVED_TAG} AS resolved, SUM(amount) \
             FROM transactions \
             WHERE amount > 0 AND substr(date, 1, 7) = ?1 \
             GROUP BY resolved"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([month], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Ledger;
    use crate::models::{sample_account, sample_transaction, Transaction};

    fn txn(id: &str, date: &str, amount: f64, category: Option<&str>, tag: Option<&str>) -> Transaction {
        let mut t = sample_transaction(id, "a1", date, amount);
        t.category = category.map(str::to_string);
        t.tag = tag.map(str::to_string);
        t
    }

    fn seeded() -> Ledger {
        let mut ledger = Ledger::open_in_memory().unwrap();
        ledger.upsert_accounts(&[sample_account("a1", "item-1")]).unwrap();
        ledger
            .upsert_transactions(&[
                txn("t1", "2024-01-05", 20.0, Some("FOOD_AND_DRINK"), None),
                txn("t2", "2024-01-06", 5.0, Some("FOOD_AND_DRINK"), Some("coffee")),
                txn("t3", "2024-01-07", 7.0, None, None),
                txn("t4", "2024-02-01", 100.0, Some("RENT"), None),
                txn("t5", "2024-02-15", -2000.0, Some("INCOME"), None),
            ])
            .unwrap();
        ledger
    }

    #[test]
    fn test_spending_by_resolved_tag_excludes_inflows() {
        let ledger = seeded();
        let split = ledger.spending_by_tag(None, None).unwrap();
        let tags: Vec<(&str, f64)> = split.iter().map(|s| (s.tag.as_str(), s.total)).collect();
        assert_eq!(
            tags,
            vec![("RENT", 100.0), ("FOOD_AND_DRINK", 20.0), ("uncategorized", 7.0), ("coffee", 5.0)]
        );
    }

    #[test]
    fn test_spending_by_tag_date_range() {
        let ledger = seeded();
        let split = ledger.spending_by_tag(Some("2024-02-01"), Some("2024-02-29")).unwrap();
        assert_eq!(split.len(), 1);
        assert_eq!(split[0].tag, "RENT");
    }

    #[test]
    fn test_monthly_spend_and_cashflow() {
        let ledger = seeded();
        let spend = ledger.monthly_spend("2024-01-01", "2024-12-31").unwrap();
        assert_eq!(spend.len(), 2);
        assert_eq!(spend[0].month, "2024-01");
        assert_eq!(spend[0].total, 32.0);

        let flow = ledger.monthly_cashflow("2024-01-01", "2024-12-31").unwrap();
        assert_eq!(flow[1].month, "2024-02");
        assert_eq!(flow[1].income, 2000.0);
        assert_eq!(flow[1].expenses, 100.0);
    }

    #[test]
    fn test_spend_by_tag_for_month() {
        let ledger = seeded();
        let jan = ledger.spend_by_tag_for_month("2024-01").unwrap();
        assert_eq!(jan.get("FOOD_AND_DRINK"), Some(&20.0));
        assert_eq!(jan.get("coffee"), Some(&5.0));
        assert_eq!(jan.get("RENT"), None);
    }
}
