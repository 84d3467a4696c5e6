use rusqlite::params;

use super::Ledger;
use crate::error::{Result, TallyError};
use crate::models::TagRule;

/// Compile a user pattern the way rules and grep evaluate it.
pub fn compile_pattern(pattern: &str) -> Result<regex::Regex> {
    regex::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| TallyError::config(format!("invalid regex '{pattern}': {e}")))
}

impl Ledger {
    /// Store a rule. The pattern must compile; nothing is written otherwise.
    pub fn add_tag_rule(&mut self, pattern: &str, tag: &str, priority: i64) -> Result<i64> {
        compile_pattern(pattern)?;
        if tag.trim().is_empty() {
            return Err(TallyError::config("tag must not be empty"));
        }
        self.conn.execute(
            "INSERT INTO tag_rules (pattern, tag, priority) VALUES (?1, ?2, ?3)",
            params![pattern, tag, priority],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Evaluation order: priority descending, then oldest first.
    pub fn list_tag_rules(&self) -> Result<Vec<TagRule>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, pattern, tag, priority, created_at FROM tag_rules \
             ORDER BY priority DESC, id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TagRule {
                    id: row.get(0)?,
                    pattern: row.get(1)?,
                    tag: row.get(2)?,
                    priority: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn delete_tag_rule(&mut self, id: i64) -> Result<bool> {
        Ok(self.conn.execute("DELETE FROM tag_rules WHERE id = ?1", [id])? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_ordered_by_priority_then_insertion() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        let low = ledger.add_tag_rule("uber", "transport", 1).unwrap();
        let high = ledger.add_tag_rule("uber eats", "food", 10).unwrap();
        let tie = ledger.add_tag_rule("lyft", "transport", 1).unwrap();

        let order: Vec<i64> = ledger.list_tag_rules().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(order, vec![high, low, tie]);
    }

    #[test]
    fn test_invalid_pattern_rejected_before_write() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        let err = ledger.add_tag_rule("([unclosed", "x", 0).unwrap_err();
        assert!(matches!(err, TallyError::Configuration(_)));
        assert!(ledger.list_tag_rules().unwrap().is_empty());
    }

    #[test]
    fn test_delete_rule() {
        let mut ledger = Ledger::open_in_memory().unwrap();
        let id = ledger.add_tag_rule("netflix", "subscriptions", 0).unwrap();
        assert!(ledger.delete_tag_rule(id).unwrap());
        assert!(!ledger.delete_tag_rule(id).unwrap());
    }

    #[test]
    fn test_compile_pattern_is_case_insensitive() {
        let re = compile_pattern("starbucks").unwrap();
        assert!(re.is_match("STARBUCKS #123"));
    }
}
