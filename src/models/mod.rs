mod fetch_config;
mod load_report;
mod stat_kind;
mod table;

pub use fetch_config::FetchConfig;
pub use load_report::{LoadReport, StatOutcome};
pub use stat_kind::StatKind;
pub use table::Table;

use std::collections::HashMap;

/// Tables of one ticker keyed by statistic
pub type TickerTables = HashMap<StatKind, Table>;
