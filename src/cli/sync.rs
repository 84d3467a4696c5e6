use comfy_table::{Cell, Table};
use serde::Serialize;
use tracing::info;

use super::{emit, open_ledger, Output};
use crate::categorizer::apply_tag_rules;
use crate::error::{Result, TallyError};
use crate::provider::PlaidClient;
use crate::reconciler::sync_all;
use crate::responses::SyncResponse;
use crate::settings::load_settings;

#[derive(Serialize)]
struct SyncOutcome {
    item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<SyncResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct SyncAllResponse {
    items: Vec<SyncOutcome>,
    tagged: usize,
}

/// Sync every linked item (or just `only`), then run the tag rules.
/// `full` forgets each item's cursor first; local tags survive the re-pull.
///
/// Items are independent: a failure is reported alongside the successes and
/// the first one becomes the command's error.
pub fn run(only: Option<&str>, full: bool, output: Output) -> Result<()> {
    let settings = load_settings()?;
    settings.require_credentials()?;

    let items: Vec<_> = match only {
        Some(id) => vec![settings
            .find_item(id)
            .cloned()
            .ok_or_else(|| TallyError::config(format!("no linked item '{id}'")))?],
        None => settings.items.clone(),
    };
    if items.is_empty() {
        return Err(TallyError::config("no linked items; add one with `tally items add`"));
    }

    let client = PlaidClient::new(settings.base_url(), &settings.client_id, &settings.secret)?;
    let mut ledger = open_ledger()?;
    if full {
        for item in &items {
            let dropped = ledger.delete_sync_state(&item.item_id)?;
            info!(item_id = %item.item_id, dropped, "cursor reset");
        }
    }
    let results = sync_all(&mut ledger, &client, &items);
    let tagged = apply_tag_rules(&mut ledger)?;
    info!(items = results.len(), tagged, "sync finished");

    let mut first_error = None;
    let mut outcomes = Vec::with_capacity(results.len());
    for (item_id, result) in results {
        match result {
            Ok(resp) => outcomes.push(SyncOutcome {
                item_id,
                result: Some(resp),
                error: None,
            }),
            Err(e) => {
                outcomes.push(SyncOutcome {
                    item_id,
                    result: None,
                    error: Some(e.to_string()),
                });
                first_error.get_or_insert(e);
            }
        }
    }

    emit(output, &SyncAllResponse { items: outcomes, tagged }, |resp| {
        let mut table = Table::new();
        table.set_header(vec!["Item", "Added", "Modified", "Removed", "Accounts", "Error"]);
        for o in &resp.items {
            let counts = o
                .result
                .as_ref()
                .map(|r| [r.added, r.modified, r.removed, r.accounts].map(|n| n.to_string()))
                .unwrap_or_default();
            table.add_row(vec![
                Cell::new(&o.item_id),
                Cell::new(&counts[0]),
                Cell::new(&counts[1]),
                Cell::new(&counts[2]),
                Cell::new(&counts[3]),
                Cell::new(o.error.as_deref().unwrap_or_default()),
            ]);
        }
        table
    })?;

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
