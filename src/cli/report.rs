use super::{emit, open_ledger, tables, Output};
use crate::error::Result;
use crate::reports;

pub fn split(from_date: Option<&str>, to_date: Option<&str>, output: Output) -> Result<()> {
    let ledger = open_ledger()?;
    let resp = reports::get_spending_split(&ledger, from_date, to_date)?;
    emit(output, &resp, tables::split)
}

pub fn burn(months: u32, output: Output) -> Result<()> {
    let ledger = open_ledger()?;
    let resp = reports::get_burn_report(&ledger, months)?;
    emit(output, &resp, tables::burn)
}

pub fn net(months: u32, output: Output) -> Result<()> {
    let ledger = open_ledger()?;
    let resp = reports::get_net_report(&ledger, months)?;
    emit(output, &resp, tables::net)
}

pub fn snapshot(output: Output) -> Result<()> {
    let ledger = open_ledger()?;
    let resp = reports::get_snapshot(&ledger)?;
    emit(output, &resp, tables::snapshot)
}
