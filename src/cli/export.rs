use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use super::{open_ledger, FilterArgs};
use crate::dates::validate_filter;
use crate::error::Result;
use crate::export::write_csv;
use crate::models::TransactionFilter;
use crate::settings::shellexpand_path;

pub fn run(filter: FilterArgs, output: Option<String>) -> Result<()> {
    let filter = TransactionFilter::from(filter);
    validate_filter(&filter)?;
    let ledger = open_ledger()?;
    let txns = ledger.get_transactions(&filter)?;

    match output {
        Some(path) => {
            let path = PathBuf::from(shellexpand_path(&path));
            write_csv(&txns, BufWriter::new(File::create(&path)?))?;
            eprintln!("Exported {} transactions to {}", txns.len(), path.display());
        }
        None => write_csv(&txns, std::io::stdout().lock())?,
    }
    Ok(())
}
