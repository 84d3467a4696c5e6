use std::collections::HashMap;

use comfy_table::{Cell, Table};
use serde::Serialize;

use super::{emit, open_ledger, Output};
use crate::error::{Result, TallyError};
use crate::reconciler;
use crate::settings::{load_settings, save_settings, LinkedItem};

/// Item listing without the access token.
#[derive(Serialize)]
struct ItemSummary {
    item_id: String,
    institution: Option<String>,
    accounts: usize,
    last_synced_at: Option<String>,
}

#[derive(Serialize)]
struct ItemsResponse {
    items: Vec<ItemSummary>,
}

pub fn add(item_id: &str, access_token: &str, institution: Option<&str>) -> Result<()> {
    if item_id.trim().is_empty() || access_token.trim().is_empty() {
        return Err(TallyError::config("item id and access token must not be empty"));
    }
    let mut settings = load_settings()?;
    settings.upsert_item(LinkedItem {
        item_id: item_id.to_string(),
        access_token: access_token.to_string(),
        institution: institution.map(str::to_string),
    });
    save_settings(&settings)?;
    eprintln!("Linked item {item_id}. Run `tally sync` to fetch transactions.");
    Ok(())
}

pub fn list(output: Output) -> Result<()> {
    let settings = load_settings()?;
    let ledger = open_ledger()?;
    let synced: HashMap<String, String> = ledger
        .list_sync_states()?
        .into_iter()
        .map(|s| (s.item_id, s.last_synced_at))
        .collect();
    let mut items = Vec::with_capacity(settings.items.len());
    for item in &settings.items {
        items.push(ItemSummary {
            item_id: item.item_id.clone(),
            institution: item.institution.clone(),
            accounts: ledger.accounts_for_item(&item.item_id)?.len(),
            last_synced_at: synced.get(&item.item_id).cloned(),
        });
    }
    emit(output, &ItemsResponse { items }, |resp| {
        let mut table = Table::new();
        table.set_header(vec!["Item", "Institution", "Accounts", "Last Synced"]);
        for i in &resp.items {
            table.add_row(vec![
                Cell::new(&i.item_id),
                Cell::new(i.institution.as_deref().unwrap_or_default()),
                Cell::new(i.accounts),
                Cell::new(i.last_synced_at.as_deref().unwrap_or("never")),
            ]);
        }
        table
    })
}

pub fn remove(item_id: &str, output: Output) -> Result<()> {
    let mut settings = load_settings()?;
    let mut ledger = open_ledger()?;
    let summary = reconciler::unlink_item(&mut ledger, item_id)?;
    if settings.remove_item(item_id).is_some() {
        save_settings(&settings)?;
    } else if summary.accounts_removed == 0 && !summary.sync_state_removed {
        return Err(TallyError::config(format!("no linked item '{item_id}'")));
    }
    emit(output, &summary, |s| {
        let mut table = Table::new();
        table.set_header(vec!["Item", "Transactions", "Accounts", "Cursor"]);
        table.add_row(vec![
            Cell::new(&s.item_id),
            Cell::new(s.transactions_removed),
            Cell::new(s.accounts_removed),
            Cell::new(if s.sync_state_removed { "removed" } else { "" }),
        ]);
        table
    })
}
