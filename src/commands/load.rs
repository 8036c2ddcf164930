use crate::error::Error;
use crate::models::{FetchConfig, LoadReport, StatKind};
use crate::services::{load_ticker, IssClient};
use crate::utils::{get_iss_url, parse_date};
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments of the `load` subcommand
#[derive(Debug, Clone, Default)]
pub struct LoadArgs {
    pub ticker: String,
    pub stats: String,
    pub force: bool,
    pub data_dir: Option<PathBuf>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<usize>,
    pub workers: Option<usize>,
}

pub fn run(args: LoadArgs) {
    let stats = match StatKind::parse_stats(&args.stats) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("❌ Error parsing statistics: {}", e);
            std::process::exit(1);
        }
    };

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if config.force_recompute {
        println!("🔄 Force recompute: cached files will be replaced");
    }
    println!(
        "📥 Loading {} [{}] into {}",
        args.ticker,
        stats.iter().map(StatKind::as_str).collect::<Vec<_>>().join(", "),
        config.data_dir().display()
    );

    match run_load(&args.ticker, &stats, &config) {
        Ok(report) => print_report(&report),
        Err(e) => {
            eprintln!("\n❌ Load failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Fold CLI overrides into the default config
pub fn build_config(args: &LoadArgs) -> Result<FetchConfig, Error> {
    let mut config = FetchConfig::default().with_force_recompute(args.force);

    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(start) = &args.start_date {
        config.start_date = parse_date(start)?;
    }
    if let Some(end) = &args.end_date {
        config.end_date = parse_date(end)?;
    }
    if let Some(limit) = args.limit {
        config.page_limit = limit;
    }
    config.max_workers = args.workers;

    config.validate()?;
    Ok(config)
}

fn run_load(ticker: &str, stats: &[StatKind], config: &FetchConfig) -> Result<LoadReport, Error> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(async {
        let client = IssClient::new(get_iss_url(), config.request_timeout)?;
        load_ticker(Arc::new(client), ticker, Some(stats), config).await
    })
}

fn print_report(report: &LoadReport) {
    println!();
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(table) => println!(
                "✅ {:<11} {:>9} rows  {:>6.1}s",
                outcome.kind.as_str(),
                table.len(),
                outcome.elapsed.as_secs_f64()
            ),
            Err(e) => println!("❌ {:<11} {}", outcome.kind.as_str(), e),
        }
    }
    println!("\n📊 {}", report.format_summary());
}
