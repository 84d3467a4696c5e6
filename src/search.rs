use crate::dates::validate_filter;
use crate::db::{compile_pattern, Ledger};
use crate::error::Result;
use crate::models::{Transaction, TransactionFilter};

pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Turn free text into an FTS5 query that matches any of its terms.
///
/// Each term is quoted as a string literal so punctuation and FTS operators
/// in user input are taken literally.
pub fn fts_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

/// Ranked full-text search over name, merchant, category and tag.
pub fn search_transactions(ledger: &Ledger, query: &str, limit: usize) -> Result<Vec<Transaction>> {
    match fts_query(query) {
        Some(expr) => ledger.search_fts(&expr, limit),
        None => Ok(Vec::new()),
    }
}

/// Regex match against "merchant_name name" on top of the usual filters.
///
/// The pattern is compiled before storage is touched. The filter's limit
/// caps the matches, not the rows scanned.
pub fn grep_transactions(ledger: &Ledger, pattern: &str, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
    let re = compile_pattern(pattern)?;
    validate_filter(filter)?;
    let unbounded = TransactionFilter {
        limit: None,
        ..filter.clone()
    };
    let matches = ledger
        .get_transactions(&unbounded)?
        .into_iter()
        .filter(|t| re.is_match(&t.match_haystack()))
        .take(filter.limit.unwrap_or(usize::MAX))
        .collect();
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;
    use crate::models::{sample_account, sample_transaction};

    fn seeded() -> Ledger {
        let mut ledger = Ledger::open_in_memory().unwrap();
        ledger.upsert_accounts(&[sample_account("a1", "item-1")]).unwrap();
        let rows = [
            ("t1", "2024-01-03", Some("Starbucks"), "STARBUCKS #123", Some("FOOD_AND_DRINK")),
            ("t2", "2024-01-04", None, "SHELL OIL 5521", Some("TRANSPORTATION")),
            ("t3", "2024-01-05", Some("Whole Foods"), "WHOLEFDS MKT", Some("FOOD_AND_DRINK")),
            ("t4", "2024-02-01", None, "STARBUCKS RESERVE", None),
        ];
        let txns: Vec<_> = rows
            .iter()
            .map(|(id, date, merchant, name, category)| {
                let mut t = sample_transaction(id, "a1", date, 10.0);
                t.merchant_name = merchant.map(str::to_string);
                t.name = name.to_string();
                t.category = category.map(str::to_string);
                t
            })
            .collect();
        ledger.upsert_transactions(&txns).unwrap();
        ledger
    }

    fn ids(txns: &[Transaction]) -> Vec<&str> {
        txns.iter().map(|t| t.transaction_id.as_str()).collect()
    }

    #[test]
    fn test_fts_query_quotes_terms() {
        assert_eq!(fts_query("  "), None);
        assert_eq!(fts_query("coffee shell").as_deref(), Some("\"coffee\" OR \"shell\""));
        assert_eq!(fts_query("a\"b").as_deref(), Some("\"a\"\"b\""));
    }

    #[test]
    fn test_blank_query_returns_nothing() {
        let ledger = seeded();
        assert!(search_transactions(&ledger, "", 50).unwrap().is_empty());
        assert!(search_transactions(&ledger, " \t ", 50).unwrap().is_empty());
    }

    #[test]
    fn test_search_matches_any_term() {
        let ledger = seeded();
        let mut found = ids(&search_transactions(&ledger, "shell whole", 50).unwrap())
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        found.sort();
        assert_eq!(found, vec!["t2", "t3"]);
    }

    #[test]
    fn test_search_covers_category_and_tag() {
        let mut ledger = seeded();
        ledger.set_transaction_tag("t2", Some("commute")).unwrap();
        assert_eq!(ids(&search_transactions(&ledger, "commute", 50).unwrap()), vec!["t2"]);
        assert_eq!(search_transactions(&ledger, "transportation", 50).unwrap().len(), 1);
    }

    #[test]
    fn test_search_operators_are_literal() {
        let ledger = seeded();
        assert!(search_transactions(&ledger, "NEAR OR", 50).unwrap().is_empty());
    }

    #[test]
    fn test_search_limit() {
        let ledger = seeded();
        assert_eq!(search_transactions(&ledger, "starbucks", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_grep_with_filters() {
        let ledger = seeded();
        let all = grep_transactions(&ledger, "starbucks", &TransactionFilter::default()).unwrap();
        assert_eq!(ids(&all), vec!["t4", "t1"]);

        let jan = TransactionFilter {
            to_date: Some("2024-01-31".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&grep_transactions(&ledger, "^starbucks", &jan).unwrap()), vec!["t1"]);

        let limited = TransactionFilter {
            limit: Some(1),
            ..Default::default()
        };
        // The newest row does not match; the limit still yields a hit.
        assert_eq!(ids(&grep_transactions(&ledger, "shell", &limited).unwrap()), vec!["t2"]);
    }

    #[test]
    fn test_grep_rejects_bad_pattern() {
        let ledger = seeded();
        let err = grep_transactions(&ledger, "(unclosed", &TransactionFilter::default()).unwrap_err();
        assert!(matches!(err, TallyError::Configuration(_)));
    }
}
