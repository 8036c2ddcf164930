use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

#[derive(Parser)]
#[command(name = "moex-stats")]
#[command(about = "Download and cache MOEX market statistics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load statistics for a ticker, fetching whatever is not cached
    Load {
        /// Exchange ticker (e.g., SBER)
        ticker: String,

        /// Statistics to load: all, or comma-separated info,tradestats,orderstats,obstats,marketdata
        #[arg(short, long, default_value = "all")]
        stats: String,

        /// Refetch even when a cache file exists
        #[arg(short, long)]
        force: bool,

        /// Cache root (defaults to $MOEX_DATA_DIR or ./data)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// First date for time-series statistics (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// Last date for time-series statistics (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// Rows per page
        #[arg(long)]
        limit: Option<usize>,

        /// Maximum concurrent downloads
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Show which statistics are cached for a ticker
    Status {
        /// Exchange ticker (e.g., SBER)
        ticker: String,

        /// Cache root (defaults to $MOEX_DATA_DIR or ./data)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Load {
            ticker,
            stats,
            force,
            data_dir,
            start_date,
            end_date,
            limit,
            workers,
        } => {
            commands::load::run(commands::load::LoadArgs {
                ticker,
                stats,
                force,
                data_dir,
                start_date,
                end_date,
                limit,
                workers,
            });
        }
        Commands::Status { ticker, data_dir } => {
            commands::status::run(ticker, data_dir);
        }
    }
}
