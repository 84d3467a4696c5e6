use super::{emit, open_ledger, tables, Output};
use crate::error::Result;
use crate::fmt::round_cents;
use crate::responses::AccountsResponse;

pub fn list(output: Output) -> Result<()> {
    let ledger = open_ledger()?;
    let accounts = ledger.list_accounts()?;
    let total_balance = round_cents(accounts.iter().filter_map(|a| a.current_balance).sum());
    emit(
        output,
        &AccountsResponse {
            accounts,
            total_balance,
        },
        tables::accounts_response,
    )
}
