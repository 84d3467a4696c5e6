use serde::Serialize;

use super::{emit, open_ledger, tables, Output};
use crate::categorizer;
use crate::error::{Result, TallyError};
use crate::responses::TagRulesResponse;

#[derive(Serialize)]
struct AppliedResponse {
    tagged: usize,
}

pub fn add(pattern: &str, tag: &str, priority: i64) -> Result<()> {
    let mut ledger = open_ledger()?;
    let id = categorizer::add_tag_rule(&mut ledger, pattern, tag, priority)?;
    eprintln!("Added rule {id}: '{pattern}' \u{2192} {tag}");
    Ok(())
}

pub fn list(output: Output) -> Result<()> {
    let ledger = open_ledger()?;
    let resp = TagRulesResponse {
        rules: ledger.list_tag_rules()?,
    };
    emit(output, &resp, |r| tables::rules(&r.rules))
}

pub fn delete(id: i64) -> Result<()> {
    let mut ledger = open_ledger()?;
    if !ledger.delete_tag_rule(id)? {
        return Err(TallyError::config(format!("no rule with id {id}")));
    }
    eprintln!("Deleted rule {id}");
    Ok(())
}

pub fn apply() -> Result<()> {
    let mut ledger = open_ledger()?;
    let tagged = categorizer::apply_tag_rules(&mut ledger)?;
    println!("{}", serde_json::to_string_pretty(&AppliedResponse { tagged })?);
    Ok(())
}
