use crate::constants::{
    DEFAULT_TIMEOUT_SECS, EXTRA_DEFAULT_WORKERS, FINISH_DATE, MAX_DEFAULT_WORKERS, PAGE_LIMIT,
    START_DATE,
};
use crate::error::{Error, Result};
use crate::utils::{get_data_dir, parse_date};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for a ticker load
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Cache root; each ticker gets a subdirectory
    pub data_dir: PathBuf,

    /// First date requested for time-series statistics
    pub start_date: NaiveDate,

    /// Last date requested for time-series statistics (inclusive)
    pub end_date: NaiveDate,

    /// Rows requested per page
    pub page_limit: usize,

    /// Page length at or above which another page is requested.
    /// `None` means `page_limit - 1`.
    pub page_threshold: Option<usize>,

    /// Ignore existing cache files and refetch
    pub force_recompute: bool,

    /// Maximum concurrent fetches. `None` sizes the pool from the host.
    pub max_workers: Option<usize>,

    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            data_dir: get_data_dir(),
            start_date: default_date(START_DATE),
            end_date: default_date(FINISH_DATE),
            page_limit: PAGE_LIMIT,
            page_threshold: None,
            force_recompute: false,
            max_workers: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

fn default_date(value: &str) -> NaiveDate {
    parse_date(value).unwrap_or_default()
}

impl FetchConfig {
    /// Default config rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_force_recompute(mut self, force: bool) -> Self {
        self.force_recompute = force;
        self
    }

    pub fn with_date_range(mut self, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = Some(max_workers);
        self
    }

    /// Check values a fetch cannot recover from
    pub fn validate(&self) -> Result<()> {
        if self.page_limit == 0 {
            return Err(Error::Config("Page limit must be positive".to_string()));
        }
        if self.start_date > self.end_date {
            return Err(Error::Config(format!(
                "Start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        if self.max_workers == Some(0) {
            return Err(Error::Config("Worker count must be positive".to_string()));
        }
        if self.page_threshold == Some(0) {
            return Err(Error::Config("Page threshold must be positive".to_string()));
        }
        Ok(())
    }

    /// A page this long is treated as full, meaning more data may remain.
    ///
    /// The default of `page_limit - 1` cannot tell a final page of exactly
    /// that length from a full one; such a page triggers one extra request.
    pub fn full_page_threshold(&self) -> usize {
        self.page_threshold
            .unwrap_or_else(|| self.page_limit.saturating_sub(1).max(1))
    }

    /// Pool size: explicit value, else host parallelism plus a few I/O slots
    pub fn worker_count(&self) -> usize {
        self.max_workers.unwrap_or_else(|| {
            let cpus = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            (cpus + EXTRA_DEFAULT_WORKERS).min(MAX_DEFAULT_WORKERS)
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::new("/tmp/cache");
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2023, 11, 30).unwrap());
        assert_eq!(config.page_limit, 50_000);
        assert_eq!(config.full_page_threshold(), 49_999);
        assert!(!config.force_recompute);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_worker_count() {
        let config = FetchConfig::new("/tmp/cache");
        let workers = config.worker_count();
        assert!(workers > EXTRA_DEFAULT_WORKERS);
        assert!(workers <= MAX_DEFAULT_WORKERS);

        assert_eq!(config.with_max_workers(2).worker_count(), 2);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = FetchConfig::new("/tmp/cache");
        assert!(base.clone().with_page_limit(0).validate().is_err());
        assert!(base.clone().with_max_workers(0).validate().is_err());

        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert!(base.with_date_range(start, end).validate().is_err());
    }

    #[test]
    fn test_threshold_for_tiny_limits() {
        let config = FetchConfig::new("/tmp/cache").with_page_limit(1);
        assert_eq!(config.full_page_threshold(), 1);

        let mut config = FetchConfig::new("/tmp/cache").with_page_limit(10);
        config.page_threshold = Some(10);
        assert_eq!(config.full_page_threshold(), 10);
    }
}
