use crate::constants::{DATE_FORMAT, DEFAULT_DATA_DIR, DEFAULT_ISS_URL};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Get the cache root from environment variable or use default
pub fn get_data_dir() -> PathBuf {
    std::env::var("MOEX_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Get the ISS root URL from environment variable or use default
pub fn get_iss_url() -> String {
    std::env::var("MOEX_ISS_URL")
        .ok()
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_ISS_URL.to_string())
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| Error::Parse(format!("Invalid date '{}': {}", value, e)))
}

/// Parse the date part of a trading date cell.
///
/// Accepts plain dates as well as "YYYY-MM-DD HH:MM:SS" and ISO 8601 values.
pub fn parse_trade_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    let date = value
        .split(|c| c == ' ' || c == 'T')
        .next()
        .unwrap_or(value);
    parse_date(date)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Reject tickers that cannot name a cache directory.
///
/// Any other name is passed to ISS as given, which decides whether it
/// exists. Empty names, path separators and `.`/`..` are refused locally
/// because the ticker becomes a directory under the data root and must not
/// point outside it.
pub fn validate_ticker(ticker: &str) -> Result<()> {
    if ticker.trim().is_empty() {
        return Err(Error::InvalidInput("Ticker must not be empty".to_string()));
    }
    if ticker.contains(['/', '\\']) || ticker == "." || ticker == ".." {
        return Err(Error::InvalidInput(format!(
            "Ticker '{}' cannot be used as a directory name",
            ticker
        )));
    }
    Ok(())
}
