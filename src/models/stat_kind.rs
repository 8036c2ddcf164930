use serde::{Deserialize, Serialize};
use std::fmt;

/// Categories of market statistics served for a ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    /// Security description snapshot -> info.csv
    Info,
    /// Per-interval trade statistics -> tradestats.csv
    TradeStats,
    /// Per-interval order statistics -> orderstats.csv
    OrderStats,
    /// Per-interval order book statistics -> obstats.csv
    ObStats,
    /// Current market data snapshot -> marketdata.csv
    MarketData,
}

impl StatKind {
    /// Every kind, in the order a full load requests them
    pub const ALL: [StatKind; 5] = [
        StatKind::Info,
        StatKind::TradeStats,
        StatKind::OrderStats,
        StatKind::ObStats,
        StatKind::MarketData,
    ];

    /// Name used by the remote API and for cache files
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Info => "info",
            StatKind::TradeStats => "tradestats",
            StatKind::OrderStats => "orderstats",
            StatKind::ObStats => "obstats",
            StatKind::MarketData => "marketdata",
        }
    }

    /// Cache filename (info.csv, tradestats.csv, ...)
    pub fn to_filename(&self) -> String {
        format!("{}.csv", self.as_str())
    }

    /// Snapshot kinds are fetched with a single undated request
    pub fn is_snapshot(&self) -> bool {
        matches!(self, StatKind::Info | StatKind::MarketData)
    }

    pub fn is_time_series(&self) -> bool {
        !self.is_snapshot()
    }

    /// Parse from string. Names are exact, as the remote API spells them.
    pub fn from_str(s: &str) -> Result<Self, String> {
        StatKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| {
                format!(
                    "Invalid statistic: {}. Valid options: {}",
                    s,
                    Self::valid_names()
                )
            })
    }

    /// Parse a list of names, collapsing duplicates in first-seen order
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>, String> {
        let mut kinds = Vec::with_capacity(names.len());
        for name in names {
            let kind = StatKind::from_str(name.as_ref())?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }

    /// Parse comma-separated names or "all"
    pub fn parse_stats(s: &str) -> Result<Vec<Self>, String> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatKind::ALL.to_vec());
        }

        let names: Vec<&str> = s.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
        if names.is_empty() {
            return Err(format!("No statistics given. Valid options: all, {}", Self::valid_names()));
        }
        Self::parse_list(&names)
    }

    fn valid_names() -> String {
        StatKind::ALL
            .iter()
            .map(StatKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
