use crate::constants::TRADE_DATE_COLUMN;
use crate::error::{Error, Result};
use crate::models::{FetchConfig, StatKind, Table};
use crate::services::stats_source::{fetch_page, fetch_snapshot, PageQuery, StatsSource};
use crate::services::table_cache::TableCache;
use crate::utils::parse_trade_date;
use tracing::{debug, info, warn};

/// Return one statistic of a ticker, from cache when possible.
///
/// On a miss (or when `config.force_recompute` is set) the statistic is
/// fetched in full and written to the cache before returning. Source and
/// I/O errors propagate.
pub async fn fetch_stat<S: StatsSource + ?Sized>(
    source: &S,
    cache: &TableCache,
    ticker: &str,
    kind: StatKind,
    config: &FetchConfig,
) -> Result<(StatKind, Table)> {
    if !config.force_recompute && is_cached(cache, ticker, kind).await? {
        let table = load_cached(cache, ticker, kind).await?;
        info!(ticker = ticker, stat = kind.as_str(), rows = table.len(), "Cache hit");
        return Ok((kind, table));
    }

    let table = if kind.is_snapshot() {
        fetch_snapshot(source, ticker, kind).await?
    } else {
        fetch_time_series(source, ticker, kind, config).await?
    };

    let table = store_table(cache, ticker, kind, table).await?;
    info!(ticker = ticker, stat = kind.as_str(), rows = table.len(), "Fetched and cached");
    Ok((kind, table))
}

/// Page through a time-series statistic from `config.start_date`.
///
/// A page at least `config.full_page_threshold()` rows long means more data
/// may remain; the next page starts the day after the last row's trade date.
/// Rows after that last trade date on the same day are not re-requested.
pub async fn fetch_time_series<S: StatsSource + ?Sized>(
    source: &S,
    ticker: &str,
    kind: StatKind,
    config: &FetchConfig,
) -> Result<Table> {
    let threshold = config.full_page_threshold();
    let mut pages: Vec<Table> = Vec::new();
    let mut cursor = config.start_date;

    loop {
        let query = PageQuery {
            from: cursor,
            till: config.end_date,
            limit: config.page_limit,
        };
        let page = fetch_page(source, ticker, kind, query).await?;
        let page_len = page.len();

        if page_len < threshold {
            pages.push(page);
            break;
        }

        if page_len < config.page_limit {
            warn!(
                ticker = ticker,
                stat = kind.as_str(),
                rows = page_len,
                limit = config.page_limit,
                "Page length is at the full-page threshold but below the limit; requesting another page"
            );
        }

        let last_date = page
            .last_value(TRADE_DATE_COLUMN)
            .ok_or_else(|| {
                Error::InvalidResponse(format!(
                    "{} {} page has no {} column",
                    ticker, kind, TRADE_DATE_COLUMN
                ))
            })
            .and_then(parse_trade_date)?;
        pages.push(page);

        let next = last_date
            .succ_opt()
            .ok_or_else(|| Error::Parse(format!("No day after {}", last_date)))?;
        if next <= cursor {
            return Err(Error::InvalidResponse(format!(
                "{} {} page ending {} did not advance past {}",
                ticker, kind, last_date, cursor
            )));
        }
        if next > config.end_date {
            debug!(ticker = ticker, stat = kind.as_str(), next = %next, "Cursor passed end date");
            break;
        }

        debug!(
            ticker = ticker,
            stat = kind.as_str(),
            page = pages.len(),
            next = %next,
            "Requesting next page"
        );
        cursor = next;
    }

    Table::concat(pages)
}

/// Cache presence check, off the async executor
async fn is_cached(cache: &TableCache, ticker: &str, kind: StatKind) -> Result<bool> {
    let cache = cache.clone();
    let ticker = ticker.to_string();
    Ok(tokio::task::spawn_blocking(move || cache.exists(&ticker, kind)).await?)
}

async fn load_cached(cache: &TableCache, ticker: &str, kind: StatKind) -> Result<Table> {
    let cache = cache.clone();
    let ticker = ticker.to_string();
    tokio::task::spawn_blocking(move || cache.load(&ticker, kind)).await?
}

async fn store_table(
    cache: &TableCache,
    ticker: &str,
    kind: StatKind,
    table: Table,
) -> Result<Table> {
    let cache = cache.clone();
    let ticker = ticker.to_string();
    tokio::task::spawn_blocking(move || {
        cache.store(&ticker, kind, &table)?;
        Ok(table)
    })
    .await?
}
