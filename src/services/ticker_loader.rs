use crate::error::{Error, Result};
use crate::models::{FetchConfig, LoadReport, StatKind, StatOutcome, TickerTables};
use crate::services::stat_fetcher::fetch_stat;
use crate::services::stats_source::StatsSource;
use crate::services::table_cache::TableCache;
use crate::utils::validate_ticker;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Load statistics of a ticker, one concurrent task per statistic.
///
/// `stats` defaults to every kind; duplicates are collapsed. Each task's
/// result lands in the report in completion order, failures included, so a
/// failed statistic never aborts its siblings. Only an invalid ticker or
/// config, or an unusable cache directory, fails the whole call.
pub async fn load_ticker<S>(
    source: Arc<S>,
    ticker: &str,
    stats: Option<&[StatKind]>,
    config: &FetchConfig,
) -> Result<LoadReport>
where
    S: StatsSource + ?Sized + 'static,
{
    validate_ticker(ticker)?;
    config.validate()?;

    let kinds = match stats {
        Some(stats) => dedupe(stats),
        None => StatKind::ALL.to_vec(),
    };

    let cache = TableCache::new(config.data_dir());
    {
        let cache = cache.clone();
        let ticker = ticker.to_string();
        tokio::task::spawn_blocking(move || cache.ensure_ticker_dir(&ticker)).await??;
    }

    let workers = config.worker_count();
    info!(
        ticker = ticker,
        stats = ?kinds.iter().map(StatKind::as_str).collect::<Vec<_>>(),
        workers = workers,
        force_recompute = config.force_recompute,
        "Loading ticker statistics"
    );

    let started = Instant::now();
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut tasks = JoinSet::new();
    let mut task_kinds = HashMap::new();

    for kind in kinds {
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        let cache = cache.clone();
        let config = config.clone();
        let ticker = ticker.to_string();

        let handle = tasks.spawn(async move {
            let task_start = Instant::now();
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => fetch_stat(source.as_ref(), &cache, &ticker, kind, &config)
                    .await
                    .map(|(_, table)| table),
                Err(e) => Err(Error::Other(format!("Worker pool closed: {}", e))),
            };
            StatOutcome {
                kind,
                result,
                elapsed: task_start.elapsed(),
            }
        });
        task_kinds.insert(handle.id(), kind);
    }

    let mut report = LoadReport::new(ticker);
    while let Some(joined) = tasks.join_next_with_id().await {
        let outcome = match joined {
            Ok((_, outcome)) => outcome,
            Err(join_error) => {
                let Some(&kind) = task_kinds.get(&join_error.id()) else {
                    warn!(ticker = ticker, "Untracked task failed: {}", join_error);
                    continue;
                };
                StatOutcome {
                    kind,
                    result: Err(Error::from(join_error)),
                    elapsed: Duration::ZERO,
                }
            }
        };

        match &outcome.result {
            Ok(table) => info!(
                ticker = ticker,
                stat = outcome.kind.as_str(),
                rows = table.len(),
                duration_s = outcome.elapsed.as_secs_f64(),
                "Statistic ready"
            ),
            Err(e) => error!(
                ticker = ticker,
                stat = outcome.kind.as_str(),
                error = %e,
                "Statistic failed"
            ),
        }
        report.push(outcome);
    }

    report.total_elapsed = started.elapsed();
    info!("{}", report.format_summary());
    Ok(report)
}

/// Like [`load_ticker`], with statistics given by name.
///
/// Every name must be a known statistic; otherwise nothing is fetched and
/// `InvalidInput` is returned.
pub async fn load_ticker_by_names<S, N>(
    source: Arc<S>,
    ticker: &str,
    names: Option<&[N]>,
    config: &FetchConfig,
) -> Result<LoadReport>
where
    S: StatsSource + ?Sized + 'static,
    N: AsRef<str>,
{
    let kinds = names
        .map(StatKind::parse_list)
        .transpose()
        .map_err(Error::InvalidInput)?;
    load_ticker(source, ticker, kinds.as_deref(), config).await
}

/// Tables of the statistics that loaded; failed ones are left out
pub async fn load_ticker_tables<S>(
    source: Arc<S>,
    ticker: &str,
    stats: Option<&[StatKind]>,
    config: &FetchConfig,
) -> Result<TickerTables>
where
    S: StatsSource + ?Sized + 'static,
{
    Ok(load_ticker(source, ticker, stats, config).await?.into_tables())
}

fn dedupe(stats: &[StatKind]) -> Vec<StatKind> {
    let mut kinds = Vec::with_capacity(stats.len());
    for kind in stats {
        if !kinds.contains(kind) {
            kinds.push(*kind);
        }
    }
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::MockSource;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FetchConfig) {
        let temp_dir = TempDir::new().unwrap();
        let config = FetchConfig::new(temp_dir.path());
        (temp_dir, config)
    }

    #[tokio::test]
    async fn test_load_all_stats() {
        let (dir, config) = setup();
        let source = Arc::new(MockSource::new());

        let report = load_ticker(source.clone(), "SBER", None, &config).await.unwrap();
        assert_eq!(report.ticker, "SBER");
        assert_eq!(report.successful(), 5);

        let tables = report.into_tables();
        assert_eq!(tables.len(), 5);
        for kind in StatKind::ALL {
            assert!(tables.contains_key(&kind));
            assert!(dir.path().join("SBER").join(kind.to_filename()).is_file());
            assert_eq!(source.calls(kind), 1);
        }
    }

    #[tokio::test]
    async fn test_second_load_hits_cache() {
        let (_dir, config) = setup();
        let source = Arc::new(MockSource::new().with_pages(StatKind::TradeStats, &[10, 2]));
        let config = config.with_page_limit(10);

        let first = load_ticker_tables(source.clone(), "SBER", None, &config).await.unwrap();
        let calls_after_first = source.total_calls();
        assert_eq!(calls_after_first, 6);

        let second = load_ticker_tables(source.clone(), "SBER", None, &config).await.unwrap();
        assert_eq!(source.total_calls(), calls_after_first);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_force_recompute_refetches() {
        let (_dir, config) = setup();
        let source = Arc::new(MockSource::new());
        let stats = [StatKind::Info, StatKind::ObStats];

        load_ticker(source.clone(), "SBER", Some(&stats[..]), &config).await.unwrap();
        let forced = config.with_force_recompute(true);
        load_ticker(source.clone(), "SBER", Some(&stats[..]), &forced).await.unwrap();

        assert_eq!(source.calls(StatKind::Info), 2);
        assert_eq!(source.calls(StatKind::ObStats), 2);
        assert_eq!(source.calls(StatKind::MarketData), 0);
    }

    #[tokio::test]
    async fn test_unknown_stat_name_fails_before_fetching() {
        let (_dir, config) = setup();
        let source = Arc::new(MockSource::new());

        let err = load_ticker_by_names(source.clone(), "SBER", Some(&["info", "candles"][..]), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(source.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_load_by_names() {
        let (_dir, config) = setup();
        let source = Arc::new(MockSource::new());

        let report = load_ticker_by_names(source.clone(), "SBER", Some(&["marketdata", "info", "info"][..]), &config)
            .await
            .unwrap();
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(source.calls(StatKind::Info), 1);

        let none: Option<&[&str]> = None;
        let report = load_ticker_by_names(source.clone(), "GAZP", none, &config).await.unwrap();
        assert_eq!(report.outcomes.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_stat_is_omitted() {
        let (dir, config) = setup();
        let source = Arc::new(MockSource::new().failing(StatKind::OrderStats));

        let report = load_ticker(source.clone(), "SBER", None, &config).await.unwrap();
        assert_eq!(report.successful(), 4);

        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, StatKind::OrderStats);
        assert!(matches!(failures[0].1, Error::Network(_)));

        let tables = report.into_tables();
        assert_eq!(tables.len(), 4);
        assert!(!tables.contains_key(&StatKind::OrderStats));
        assert!(!dir.path().join("SBER").join("orderstats.csv").exists());
    }

    #[tokio::test]
    async fn test_panicking_stat_is_reported() {
        let (_dir, config) = setup();
        let source = Arc::new(MockSource::new().panicking(StatKind::Info));

        let report = load_ticker(source, "SBER", None, &config).await.unwrap();
        assert_eq!(report.successful(), 4);
        assert_eq!(report.failures()[0].0, StatKind::Info);
    }

    #[tokio::test]
    async fn test_worker_pool_bounds_concurrency() {
        let (_dir, config) = setup();
        let source = Arc::new(MockSource::new().with_delay(Duration::from_millis(20)));
        let config = config.with_max_workers(2);

        let report = load_ticker(source.clone(), "SBER", None, &config).await.unwrap();
        assert_eq!(report.successful(), 5);
        assert!(source.max_in_flight() <= 2);
    }

    #[tokio::test]
    async fn test_creates_ticker_dir_for_empty_request() {
        let (dir, config) = setup();
        let source = Arc::new(MockSource::new());

        let report = load_ticker(source.clone(), "LKOH", Some(&[][..]), &config).await.unwrap();
        assert!(report.outcomes.is_empty());
        assert!(dir.path().join("LKOH").is_dir());
        assert_eq!(source.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_ticker_rejected() {
        let (_dir, config) = setup();
        let source = Arc::new(MockSource::new());

        let err = load_ticker(source.clone(), "../SBER", None, &config).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(source.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_works_through_trait_object() {
        let (_dir, config) = setup();
        let source: Arc<dyn StatsSource> = Arc::new(MockSource::new());

        let tables = load_ticker_tables(source, "SBER", Some(&[StatKind::Info][..]), &config)
            .await
            .unwrap();
        assert_eq!(tables.len(), 1);
    }
}
