//! Fetch defaults and ISS endpoint constants.
//!
//! These are the defaults of [`crate::models::FetchConfig`]; nothing reads
//! them directly during a fetch.

/// First trading date requested for time-series statistics
pub const START_DATE: &str = "2020-01-01";

/// Last trading date requested for time-series statistics (inclusive)
pub const FINISH_DATE: &str = "2023-11-30";

/// Rows requested per page from the ALGOPACK endpoints
pub const PAGE_LIMIT: usize = 50_000;

/// Date format used in ISS query strings and in the `tradedate` column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Column holding the trading date of a time-series row
pub const TRADE_DATE_COLUMN: &str = "tradedate";

/// Default ISS root
pub const DEFAULT_ISS_URL: &str = "https://iss.moex.com/iss";

/// Board used for snapshot (info / marketdata) requests
pub const DEFAULT_BOARD: &str = "TQBR";

/// HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Upper bound of the default worker pool
pub const MAX_DEFAULT_WORKERS: usize = 32;

/// Extra workers on top of the host parallelism (fetches are I/O bound)
pub const EXTRA_DEFAULT_WORKERS: usize = 4;

/// Default cache root when `MOEX_DATA_DIR` is unset
pub const DEFAULT_DATA_DIR: &str = "data";
