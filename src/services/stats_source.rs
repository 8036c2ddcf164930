use crate::error::{Error, Result};
use crate::models::{StatKind, Table};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Date window and page size of one time-series request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub from: NaiveDate,
    pub till: NaiveDate,
    pub limit: usize,
}

/// Remote source of market statistics, one accessor per statistic kind
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn info(&self, ticker: &str) -> Result<Table>;

    async fn marketdata(&self, ticker: &str) -> Result<Table>;

    async fn tradestats(&self, ticker: &str, query: PageQuery) -> Result<Table>;

    async fn orderstats(&self, ticker: &str, query: PageQuery) -> Result<Table>;

    async fn obstats(&self, ticker: &str, query: PageQuery) -> Result<Table>;
}

/// Call the snapshot accessor for `kind`. Time-series kinds need a query.
pub async fn fetch_snapshot<S: StatsSource + ?Sized>(
    source: &S,
    ticker: &str,
    kind: StatKind,
) -> Result<Table> {
    match kind {
        StatKind::Info => source.info(ticker).await,
        StatKind::MarketData => source.marketdata(ticker).await,
        StatKind::TradeStats | StatKind::OrderStats | StatKind::ObStats => Err(
            Error::InvalidInput(format!("{} is not a snapshot statistic", kind)),
        ),
    }
}

/// Call the time-series accessor for `kind` with one page query
pub async fn fetch_page<S: StatsSource + ?Sized>(
    source: &S,
    ticker: &str,
    kind: StatKind,
    query: PageQuery,
) -> Result<Table> {
    match kind {
        StatKind::TradeStats => source.tradestats(ticker, query).await,
        StatKind::OrderStats => source.orderstats(ticker, query).await,
        StatKind::ObStats => source.obstats(ticker, query).await,
        StatKind::Info | StatKind::MarketData => Err(Error::InvalidInput(format!(
            "{} is not a time-series statistic",
            kind
        ))),
    }
}
