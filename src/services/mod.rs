mod iss_client;
mod stat_fetcher;
mod stats_source;
mod table_cache;
mod ticker_loader;

#[cfg(test)]
pub(crate) mod test_support;

pub use iss_client::{parse_block, IssClient};
pub use stat_fetcher::{fetch_stat, fetch_time_series};
pub use stats_source::{fetch_page, fetch_snapshot, PageQuery, StatsSource};
pub use table_cache::{CacheEntry, TableCache};
pub use ticker_loader::{load_ticker, load_ticker_by_names, load_ticker_tables};
