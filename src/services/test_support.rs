//! In-memory `StatsSource` for fetcher and loader tests.

use crate::error::{Error, Result};
use crate::models::{StatKind, Table};
use crate::services::stats_source::{PageQuery, StatsSource};
use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Serves scripted page sizes per statistic and records every call.
///
/// Time-series rows are dated five days after the query's `from`, so each
/// full page moves the cursor forward by six days.
pub(crate) struct MockSource {
    pages: HashMap<StatKind, Vec<usize>>,
    failing: HashSet<StatKind>,
    panicking: HashSet<StatKind>,
    date_column: &'static str,
    delay: Duration,
    calls: Mutex<HashMap<StatKind, usize>>,
    queries: Mutex<Vec<(StatKind, PageQuery)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockSource {
    pub(crate) fn new() -> Self {
        Self {
            pages: HashMap::new(),
            failing: HashSet::new(),
            panicking: HashSet::new(),
            date_column: "tradedate",
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            queries: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_pages(mut self, kind: StatKind, sizes: &[usize]) -> Self {
        self.pages.insert(kind, sizes.to_vec());
        self
    }

    pub(crate) fn failing(mut self, kind: StatKind) -> Self {
        self.failing.insert(kind);
        self
    }

    pub(crate) fn panicking(mut self, kind: StatKind) -> Self {
        self.panicking.insert(kind);
        self
    }

    pub(crate) fn with_date_column(mut self, column: &'static str) -> Self {
        self.date_column = column;
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self, kind: StatKind) -> usize {
        self.calls.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub(crate) fn queries(&self) -> Vec<(StatKind, PageQuery)> {
        self.queries.lock().unwrap().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Count the call and return its zero-based index for this kind
    async fn enter(&self, kind: StatKind) -> Result<usize> {
        let call_idx = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(kind).or_insert(0);
            *count += 1;
            *count - 1
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panicking.contains(&kind) {
            panic!("scripted panic for {}", kind);
        }
        if self.failing.contains(&kind) {
            return Err(Error::Network(format!("scripted failure for {}", kind)));
        }
        Ok(call_idx)
    }

    fn snapshot(&self, ticker: &str, kind: StatKind) -> Table {
        Table::new(
            vec!["SECID".to_string(), "BLOCK".to_string()],
            vec![vec![ticker.to_string(), kind.as_str().to_string()]],
        )
        .unwrap()
    }

    fn page(&self, ticker: &str, kind: StatKind, call_idx: usize, query: &PageQuery) -> Table {
        let size = self
            .pages
            .get(&kind)
            .and_then(|sizes| sizes.get(call_idx))
            .copied()
            .unwrap_or(if call_idx == 0 { 3 } else { 0 });
        let row_date = (query.from + ChronoDuration::days(5)).format("%Y-%m-%d").to_string();

        let rows = (0..size)
            .map(|i| {
                vec![
                    row_date.clone(),
                    ticker.to_string(),
                    format!("{}-{}", call_idx, i),
                ]
            })
            .collect();
        Table::new(
            vec![self.date_column.to_string(), "secid".to_string(), "seq".to_string()],
            rows,
        )
        .unwrap()
    }

    async fn series(&self, ticker: &str, kind: StatKind, query: PageQuery) -> Result<Table> {
        self.queries.lock().unwrap().push((kind, query));
        let call_idx = self.enter(kind).await?;
        Ok(self.page(ticker, kind, call_idx, &query))
    }
}

#[async_trait]
impl StatsSource for MockSource {
    async fn info(&self, ticker: &str) -> Result<Table> {
        self.enter(StatKind::Info).await?;
        Ok(self.snapshot(ticker, StatKind::Info))
    }

    async fn marketdata(&self, ticker: &str) -> Result<Table> {
        self.enter(StatKind::MarketData).await?;
        Ok(self.snapshot(ticker, StatKind::MarketData))
    }

    async fn tradestats(&self, ticker: &str, query: PageQuery) -> Result<Table> {
        self.series(ticker, StatKind::TradeStats, query).await
    }

    async fn orderstats(&self, ticker: &str, query: PageQuery) -> Result<Table> {
        self.series(ticker, StatKind::OrderStats, query).await
    }

    async fn obstats(&self, ticker: &str, query: PageQuery) -> Result<Table> {
        self.series(ticker, StatKind::ObStats, query).await
    }
}
