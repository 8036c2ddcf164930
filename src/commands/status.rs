use crate::models::StatKind;
use crate::services::TableCache;
use crate::utils::{get_data_dir, validate_ticker};
use std::path::PathBuf;

pub fn run(ticker: String, data_dir: Option<PathBuf>) {
    let cache = TableCache::new(data_dir.unwrap_or_else(get_data_dir));
    println!("📊 Cache status for {} ({})\n", ticker, cache.root().display());

    if let Err(e) = show_status(&cache, &ticker) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn show_status(cache: &TableCache, ticker: &str) -> Result<(), Box<dyn std::error::Error>> {
    validate_ticker(ticker)?;
    let entries = cache.entries(ticker)?;

    if entries.is_empty() {
        println!("⚠️  Nothing cached yet. Run 'load {}' first.", ticker);
        return Ok(());
    }

    for kind in StatKind::ALL {
        match entries.iter().find(|e| e.kind == kind) {
            Some(entry) => match cache.load(ticker, kind) {
                Ok(table) => println!(
                    "   {:<11} {:>9} rows  {:>10}",
                    kind.as_str(),
                    format_number(table.len()),
                    format_size(entry.size_bytes)
                ),
                Err(e) => println!("   {:<11} unreadable: {}", kind.as_str(), e),
            },
            None => println!("   {:<11} (not cached)", kind.as_str()),
        }
    }

    Ok(())
}

fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f >= MB {
        format!("{:.1} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(130_000), "130,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
