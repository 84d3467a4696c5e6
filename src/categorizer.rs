use regex::Regex;
use tracing::{info, warn};

use crate::db::{compile_pattern, Ledger};
use crate::error::Result;
use crate::models::TagRule;

/// Tag every untagged transaction with the first matching rule.
///
/// Rules run in priority order (ties: oldest first) against
/// "merchant_name name". Already-tagged rows are never revisited, so adding
/// rules later only affects transactions that are still untagged. Returns
/// the number of rows newly tagged.
pub fn apply_tag_rules(ledger: &mut Ledger) -> Result<usize> {
    let rules = ledger.list_tag_rules()?;
    if rules.is_empty() {
        return Ok(0);
    }
    let compiled: Vec<(Regex, &TagRule)> = rules
        .iter()
        .filter_map(|rule| match compile_pattern(&rule.pattern) {
            Ok(re) => Some((re, rule)),
            Err(e) => {
                warn!(rule_id = rule.id, error = %e, "skipping rule with invalid pattern");
                None
            }
        })
        .collect();

    let untagged = ledger.untagged_transactions()?;
    let assignments: Vec<(String, String)> = untagged
        .iter()
        .filter_map(|txn| {
            let haystack = txn.match_haystack();
            compiled
                .iter()
                .find(|(re, _)| re.is_match(&haystack))
                .map(|(_, rule)| (txn.transaction_id.clone(), rule.tag.clone()))
        })
        .collect();

    let tagged = ledger.apply_tags(&assignments)?;
    info!(tagged, untagged = untagged.len() - tagged, "applied tag rules");
    Ok(tagged)
}

/// Validate and store a rule.
pub fn add_tag_rule(ledger: &mut Ledger, pattern: &str, tag: &str, priority: i64) -> Result<i64> {
    ledger.add_tag_rule(pattern, tag, priority)
}
