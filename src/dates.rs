use chrono::{Datelike, Local, NaiveDate};

use crate::error::{Result, TallyError};
use crate::models::TransactionFilter;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `YYYY-MM` for the month containing `date`.
pub fn month_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn current_month() -> String {
    month_of(today())
}

/// Parse a `YYYY-MM-DD` date, failing with a configuration error.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .filter(|_| raw.len() == 10)
        .ok_or_else(|| TallyError::config(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

/// Reject anything that is not a real `YYYY-MM` month.
pub fn validate_month(month: &str) -> Result<()> {
    if month.len() != 7 {
        return Err(TallyError::config(format!("invalid month '{month}', expected YYYY-MM")));
    }
    parse_date(&format!("{month}-01"))
        .map(|_| ())
        .map_err(|_| TallyError::config(format!("invalid month '{month}', expected YYYY-MM")))
}

/// Both date bounds of a filter must be real dates.
pub fn validate_filter(filter: &TransactionFilter) -> Result<()> {
    for raw in [&filter.from_date, &filter.to_date].into_iter().flatten() {
        parse_date(raw)?;
    }
    Ok(())
}

/// First day of the month `n` months before the month containing `date`.
pub fn month_start_back(date: NaiveDate, n: u32) -> Result<NaiveDate> {
    let index = date.year() * 12 + date.month0() as i32 - n as i32;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
        .ok_or_else(|| TallyError::Other(format!("date out of range: {n} months before {date}")))
}

/// Inclusive `[start, end]` covering the trailing `months` calendar months
/// ending with the month of `today`.
pub fn trailing_window(today: NaiveDate, months: u32) -> Result<(String, String)> {
    if months == 0 {
        return Err(TallyError::config("months must be at least 1"));
    }
    let start = month_start_back(today, months - 1)?;
    Ok((
        start.format("%Y-%m-%d").to_string(),
        today.format("%Y-%m-%d").to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2024-02-29").is_ok());
        assert!(matches!(parse_date("2023-02-29"), Err(TallyError::Configuration(_))));
        assert!(parse_date("02/01/2024").is_err());
        assert!(parse_date("2024-2-1").is_err());
    }

    #[test]
    fn test_validate_month() {
        assert!(validate_month("2024-03").is_ok());
        assert!(validate_month("2024-13").is_err());
        assert!(validate_month("2024-3").is_err());
        assert!(validate_month("March").is_err());
    }

    #[test]
    fn test_validate_filter() {
        let mut filter = TransactionFilter {
            from_date: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        assert!(validate_filter(&filter).is_ok());
        filter.to_date = Some("yesterday".to_string());
        assert!(validate_filter(&filter).is_err());
    }

    #[test]
    fn test_month_start_back_crosses_year() {
        assert_eq!(month_start_back(d("2024-02-15"), 0).unwrap(), d("2024-02-01"));
        assert_eq!(month_start_back(d("2024-02-15"), 2).unwrap(), d("2023-12-01"));
        assert_eq!(month_start_back(d("2024-02-15"), 14).unwrap(), d("2022-12-01"));
    }

    #[test]
    fn test_trailing_window() {
        let (start, end) = trailing_window(d("2024-06-10"), 6).unwrap();
        assert_eq!(start, "2024-01-01");
        assert_eq!(end, "2024-06-10");
        assert!(trailing_window(d("2024-06-10"), 0).is_err());
    }

    #[test]
    fn test_month_of() {
        assert_eq!(month_of(d("2024-06-10")), "2024-06");
    }
}
