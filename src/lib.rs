pub mod cli;
pub mod commands;
pub mod constants;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{AppError, Error, Result};
pub use models::{FetchConfig, LoadReport, StatKind, StatOutcome, Table, TickerTables};
pub use services::{load_ticker, load_ticker_by_names, load_ticker_tables, IssClient, StatsSource};
