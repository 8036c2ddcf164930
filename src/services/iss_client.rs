use crate::constants::{DEFAULT_BOARD, DEFAULT_TIMEOUT_SECS};
use crate::error::Error;
use crate::models::{StatKind, Table};
use crate::services::stats_source::{PageQuery, StatsSource};
use crate::utils::format_date;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

/// Client for the MOEX ISS API (securities snapshots and ALGOPACK statistics)
pub struct IssClient {
    base_url: String,
    board: String,
    client: reqwest::Client,
}

impl IssClient {
    /// Create a new ISS client
    ///
    /// # Arguments
    /// * `base_url` - ISS root (e.g., "https://iss.moex.com/iss")
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, Error> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid base_url: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        info!("Created IssClient: base_url='{}'", base_url);

        Ok(Self {
            base_url,
            board: DEFAULT_BOARD.to_string(),
            client,
        })
    }

    pub fn with_default_timeout(base_url: String) -> Result<Self, Error> {
        Self::new(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Use another trading board for snapshot requests
    pub fn with_board(mut self, board: impl Into<String>) -> Self {
        self.board = board.into();
        self
    }

    /// URL of a snapshot block (`securities` or `marketdata`) for a ticker
    pub fn snapshot_url(&self, ticker: &str, block: &str) -> String {
        format!(
            "{}/engines/stock/markets/shares/boards/{}/securities/{}.json?iss.meta=off&iss.only={}",
            self.base_url, self.board, ticker, block
        )
    }

    /// URL of one ALGOPACK request, `start` rows into the query window
    pub fn series_url(
        &self,
        ticker: &str,
        kind: StatKind,
        query: &PageQuery,
        start: usize,
    ) -> String {
        format!(
            "{}/datashop/algopack/eq/{}/{}.json?iss.meta=off&from={}&till={}&start={}&limit={}",
            self.base_url,
            kind.as_str(),
            ticker,
            format_date(query.from),
            format_date(query.till),
            start,
            query.limit
        )
    }

    async fn get_json(&self, url: &str) -> Result<Value, Error> {
        debug!("Sending request to: {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            let error_msg = format!("ISS request failed: {} (url: {})", e, url);
            error!("{}", error_msg);
            Error::Network(error_msg)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(Error::Network(format!(
                "ISS returned error status {}: {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response body: {}", e)))?;

        serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("Failed to parse ISS response: {}", e)))
    }

    async fn fetch_block(&self, url: &str, block: &str) -> Result<Table, Error> {
        let json = self.get_json(url).await?;
        parse_block(&json, block)
    }

    /// Fill one page of up to `query.limit` rows.
    ///
    /// ISS may answer with fewer rows than asked for, so requests continue
    /// from the `start` offset until the page is full, the server returns
    /// no rows, or `data.cursor` reports the window exhausted.
    async fn fetch_series(
        &self,
        ticker: &str,
        kind: StatKind,
        query: PageQuery,
    ) -> Result<Table, Error> {
        let mut chunks = Vec::new();
        let mut collected = 0;

        while collected < query.limit {
            let chunk_query = PageQuery {
                limit: query.limit - collected,
                ..query
            };
            let url = self.series_url(ticker, kind, &chunk_query, collected);
            let json = self.get_json(&url).await?;
            let chunk = parse_block(&json, "data")?;

            if chunk.is_empty() {
                chunks.push(chunk);
                break;
            }
            collected += chunk.len();
            chunks.push(chunk);

            if cursor_total(&json).is_some_and(|total| collected >= total) {
                break;
            }
        }

        let table = Table::concat(chunks)?;
        debug!(
            ticker = ticker,
            stat = kind.as_str(),
            from = %query.from,
            rows = table.len(),
            "Fetched ALGOPACK page"
        );
        Ok(table)
    }
}

/// Total row count of the query window, from the `data.cursor` block
fn cursor_total(json: &Value) -> Option<usize> {
    let cursor = parse_block(json, "data.cursor").ok()?;
    let idx = cursor.column_index("TOTAL")?;
    cursor.rows().first()?.get(idx)?.parse().ok()
}

/// Extract the named block of an ISS response as a table
pub fn parse_block(json: &Value, block: &str) -> Result<Table, Error> {
    let block_value = json
        .get(block)
        .ok_or_else(|| Error::InvalidResponse(format!("Missing block: {}", block)))?;
    Table::from_iss_block(block_value)
}

#[async_trait]
impl StatsSource for IssClient {
    async fn info(&self, ticker: &str) -> Result<Table, Error> {
        let url = self.snapshot_url(ticker, "securities");
        self.fetch_block(&url, "securities").await
    }

    async fn marketdata(&self, ticker: &str) -> Result<Table, Error> {
        let url = self.snapshot_url(ticker, "marketdata");
        self.fetch_block(&url, "marketdata").await
    }

    async fn tradestats(&self, ticker: &str, query: PageQuery) -> Result<Table, Error> {
        self.fetch_series(ticker, StatKind::TradeStats, query).await
    }

    async fn orderstats(&self, ticker: &str, query: PageQuery) -> Result<Table, Error> {
        self.fetch_series(ticker, StatKind::OrderStats, query).await
    }

    async fn obstats(&self, ticker: &str, query: PageQuery) -> Result<Table, Error> {
        self.fetch_series(ticker, StatKind::ObStats, query).await
    }
}
