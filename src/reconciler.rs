//! Incremental sync: merge paginated add / modify / remove deltas from the
//! upstream feed into the ledger.
//!
//! A pass accumulates every page in memory and lands them with a single
//! commit that also advances the cursor. A failed page aborts the pass
//! before anything is written, so the next run resumes from the last
//! committed cursor.

use tracing::{debug, info, warn};

use crate::db::Ledger;
use crate::error::{Result, TallyError};
use crate::models::{Account, Transaction};
use crate::provider::{FeedAccount, FeedTransaction, TransactionFeed};
use crate::responses::{SyncResponse, UnlinkResponse};
use crate::settings::LinkedItem;

pub fn map_account(item_id: &str, a: &FeedAccount) -> Account {
    Account {
        account_id: a.account_id.clone(),
        source_item_id: item_id.to_string(),
        name: a.name.clone(),
        official_name: a.official_name.clone(),
        account_type: a.account_type.clone(),
        subtype: a.subtype.clone(),
        mask: a.mask.clone(),
        current_balance: a.balances.current,
        available_balance: a.balances.available,
        currency_code: a.balances.iso_currency_code.clone(),
        updated_at: String::new(),
    }
}

pub fn map_transaction(t: &FeedTransaction) -> Transaction {
    let (category, subcategory) = match &t.personal_finance_category {
        Some(pfc) => (Some(pfc.primary.clone()), pfc.detailed.clone()),
        None => {
            let legacy = t.category.as_deref().unwrap_or_default();
            (legacy.first().cloned(), legacy.get(1).cloned())
        }
    };
    Transaction {
        transaction_id: t.transaction_id.clone(),
        account_id: t.account_id.clone(),
        amount: t.amount,
        currency_code: t.iso_currency_code.clone(),
        date: t.date.clone(),
        authorized_date: t.authorized_date.clone(),
        name: t.merchant_name.clone().unwrap_or_else(|| t.name.clone()),
        merchant_name: t.merchant_name.clone(),
        pending: t.pending,
        category,
        subcategory,
        payment_channel: t.payment_channel.clone(),
        transaction_type: t.transaction_type.clone(),
        tag: None,
    }
}

/// Run one reconciliation pass for a single item.
pub fn sync_item(
    ledger: &mut Ledger,
    feed: &dyn TransactionFeed,
    item_id: &str,
    access_token: &str,
) -> Result<SyncResponse> {
    let mut cursor = ledger
        .get_sync_state(item_id)?
        .map(|s| s.cursor)
        .unwrap_or_default();

    let mut changed: Vec<Transaction> = Vec::new();
    let mut removed: Vec<String> = Vec::new();
    let mut added_count = 0usize;
    let mut modified_count = 0usize;
    let mut account_count = 0usize;
    let mut pages = 0usize;

    loop {
        let page = feed.sync_page(access_token, &cursor)?;
        pages += 1;
        debug!(
            item_id,
            page = pages,
            added = page.added.len(),
            modified = page.modified.len(),
            removed = page.removed.len(),
            "received sync page"
        );

        // Account snapshots are idempotent; land them right away.
        let accounts: Vec<Account> = page.accounts.iter().map(|a| map_account(item_id, a)).collect();
        account_count += ledger.upsert_accounts(&accounts)?;

        added_count += page.added.len();
        modified_count += page.modified.len();
        changed.extend(page.added.iter().chain(page.modified.iter()).map(map_transaction));
        removed.extend(page.removed.into_iter().map(|r| r.transaction_id));

        cursor = page.next_cursor;
        if !page.has_more {
            break;
        }
    }

    let counts = ledger.commit_sync(item_id, &changed, &removed, &cursor)?;
    info!(
        item_id,
        pages,
        upserted = counts.upserted,
        removed = counts.removed,
        "sync committed"
    );

    Ok(SyncResponse {
        item_id: item_id.to_string(),
        added: added_count,
        modified: modified_count,
        removed: removed.len(),
        accounts: account_count,
        cursor,
        has_more: false,
    })
}

/// Sync each item in order. One item failing does not undo or stop the others.
pub fn sync_all(
    ledger: &mut Ledger,
    feed: &dyn TransactionFeed,
    items: &[LinkedItem],
) -> Vec<(String, Result<SyncResponse>)> {
    items
        .iter()
        .map(|item| {
            let result = sync_item(ledger, feed, &item.item_id, &item.access_token).map_err(|e| {
                warn!(item_id = %item.item_id, error = %e, "sync failed");
                TallyError::Reconciliation {
                    item_id: item.item_id.clone(),
                    source: Box::new(e),
                }
            });
            (item.item_id.clone(), result)
        })
        .collect()
}

/// Drop an item's transactions, accounts, and cursor.
pub fn unlink_item(ledger: &mut Ledger, item_id: &str) -> Result<UnlinkResponse> {
    let counts = ledger.unlink_item(item_id)?;
    info!(
        item_id,
        transactions = counts.transactions,
        accounts = counts.accounts,
        "item unlinked"
    );
    Ok(UnlinkResponse {
        item_id: item_id.to_string(),
        transactions_removed: counts.transactions,
        accounts_removed: counts.accounts,
        sync_state_removed: counts.sync_states > 0,
    })
}
