use crate::error::AppError;
use crate::models::{StatKind, Table};
use std::collections::HashMap;
use std::time::Duration;

/// Result of fetching one statistic
#[derive(Debug, Clone)]
pub struct StatOutcome {
    pub kind: StatKind,
    pub result: Result<Table, AppError>,
    /// Wall time of the task, cache hits included
    pub elapsed: Duration,
}

impl StatOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a ticker load, in completion order
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub ticker: String,
    pub outcomes: Vec<StatOutcome>,
    pub total_elapsed: Duration,
}

impl LoadReport {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, outcome: StatOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn successful(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.successful()
    }

    pub fn get(&self, kind: StatKind) -> Option<&Table> {
        self.outcomes
            .iter()
            .find(|o| o.kind == kind)
            .and_then(|o| o.result.as_ref().ok())
    }

    /// Failed statistics with their causes
    pub fn failures(&self) -> Vec<(StatKind, &AppError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.kind, e)))
            .collect()
    }

    /// Tables of the successful statistics; failed ones are omitted
    pub fn into_tables(self) -> HashMap<StatKind, Table> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.ok().map(|table| (o.kind, table)))
            .collect()
    }

    /// Format for display
    pub fn format_summary(&self) -> String {
        format!(
            "{} | {} ok, {} failed | {:.1}s",
            self.ticker,
            self.successful(),
            self.failed(),
            self.total_elapsed.as_secs_f64()
        )
    }
}
