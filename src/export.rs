use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;

use crate::error::Result;
use crate::models::Transaction;

pub const CSV_HEADER: [&str; 11] = [
    "transaction_id",
    "account_id",
    "date",
    "name",
    "merchant_name",
    "amount",
    "category",
    "subcategory",
    "tag",
    "pending",
    "payment_channel",
];

#[derive(Serialize)]
struct ExportRow<'a> {
    transaction_id: &'a str,
    account_id: &'a str,
    date: &'a str,
    name: &'a str,
    merchant_name: Option<&'a str>,
    amount: String,
    category: Option<&'a str>,
    subcategory: Option<&'a str>,
    tag: Option<&'a str>,
    pending: bool,
    payment_channel: Option<&'a str>,
}

impl<'a> From<&'a Transaction> for ExportRow<'a> {
    fn from(t: &'a Transaction) -> Self {
        Self {
            transaction_id: &t.transaction_id,
            account_id: &t.account_id,
            date: &t.date,
            name: &t.name,
            merchant_name: t.merchant_name.as_deref(),
            amount: format!("{:.2}", t.amount),
            category: t.category.as_deref(),
            subcategory: t.subcategory.as_deref(),
            tag: t.tag.as_deref(),
            pending: t.pending,
            payment_channel: t.payment_channel.as_deref(),
        }
    }
}

/// Write transactions as RFC 4180 CSV. The header is always written and
/// every record ends with `\n`; absent fields are empty.
pub fn write_csv<W: Write>(txns: &[Transaction], out: W) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for txn in txns {
        writer.serialize(ExportRow::from(txn))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_transaction;

    fn to_csv_string(txns: &[Transaction]) -> Result<String> {
        let mut buf = Vec::new();
        write_csv(txns, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap())
    }

    const HEADER: &str =
        "transaction_id,account_id,date,name,merchant_name,amount,category,subcategory,tag,pending,payment_channel\n";

    #[test]
    fn test_empty_export_is_header_only() {
        assert_eq!(to_csv_string(&[]).unwrap(), HEADER);
    }

    #[test]
    fn test_nulls_render_empty() {
        let mut t = sample_transaction("t1", "a1", "2024-01-02", 4.5);
        t.name = "Coffee".to_string();
        t.payment_channel = None;
        let out = to_csv_string(&[t]).unwrap();
        assert_eq!(out, format!("{HEADER}t1,a1,2024-01-02,Coffee,,4.50,,,,false,\n"));
        assert!(!out.contains("null"));
    }

    #[test]
    fn test_quotes_are_doubled() {
        let mut t = sample_transaction("t1", "a1", "2024-01-02", -2500.0);
        t.name = "Salary \"Direct Deposit\"".to_string();
        t.merchant_name = Some("Acme, Inc.".to_string());
        t.tag = Some("income".to_string());
        t.pending = true;
        let out = to_csv_string(&[t]).unwrap();
        let line = out.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "t1,a1,2024-01-02,\"Salary \"\"Direct Deposit\"\"\",\"Acme, Inc.\",-2500.00,,,income,true,online"
        );
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_embedded_newline_is_quoted() {
        let mut t = sample_transaction("t1", "a1", "2024-01-02", 1.0);
        t.name = "line one\nline two".to_string();
        let out = to_csv_string(&[t]).unwrap();
        assert!(out.contains("\"line one\nline two\""));
    }
}
