//! CSV cache of fetched tables.
//!
//! Layout: `<root>/<ticker>/<stat>.csv`. The first CSV column holds the
//! zero-based row number under an empty header and is dropped on load.

use crate::error::{Error, Result};
use crate::models::{StatKind, Table};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Summary of one cached file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub kind: StatKind,
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct TableCache {
    root: PathBuf,
}

impl TableCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ticker_dir(&self, ticker: &str) -> PathBuf {
        self.root.join(ticker)
    }

    pub fn path(&self, ticker: &str, kind: StatKind) -> PathBuf {
        self.ticker_dir(ticker).join(kind.to_filename())
    }

    /// Create the ticker directory (and the root) if missing
    pub fn ensure_ticker_dir(&self, ticker: &str) -> Result<PathBuf> {
        let dir = self.ticker_dir(ticker);
        fs::create_dir_all(&dir)
            .map_err(|e| Error::Io(format!("Failed to create {}: {}", dir.display(), e)))?;
        Ok(dir)
    }

    /// Presence of the file is the only validity signal
    pub fn exists(&self, ticker: &str, kind: StatKind) -> bool {
        self.path(ticker, kind).is_file()
    }

    /// Load a cached table as written, without re-typing any column
    pub fn load(&self, ticker: &str, kind: StatKind) -> Result<Table> {
        let path = self.path(ticker, kind);
        if !path.is_file() {
            return Err(Error::NotFound(format!("No cached {} for {}", kind, ticker)));
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .map_err(|e| Error::Io(format!("Failed to read {}: {}", path.display(), e)))?;

        let headers = reader
            .headers()
            .map_err(|e| Error::Io(format!("CSV header error in {}: {}", path.display(), e)))?
            .clone();
        let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result
                .map_err(|e| Error::Io(format!("CSV parse error in {}: {}", path.display(), e)))?;
            rows.push(record.iter().skip(1).map(str::to_string).collect());
        }

        debug!(path = %path.display(), rows = rows.len(), "Loaded cached table");
        Table::new(columns, rows)
            .map_err(|e| Error::Parse(format!("Corrupt cache file {}: {}", path.display(), e)))
    }

    /// Write the table, replacing any previous file.
    ///
    /// Data goes to a sibling temp file first and is renamed into place, so
    /// an interrupted write never leaves a truncated cache file behind.
    pub fn store(&self, ticker: &str, kind: StatKind, table: &Table) -> Result<PathBuf> {
        self.ensure_ticker_dir(ticker)?;
        let path = self.path(ticker, kind);
        let temp_path = path.with_extension("csv.tmp");

        if let Err(e) = write_csv(&temp_path, table) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            Error::Io(format!("Failed to move {} into place: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), rows = table.len(), "Stored table");
        Ok(path)
    }

    /// Cached statistics of a ticker, in canonical kind order
    pub fn entries(&self, ticker: &str) -> Result<Vec<CacheEntry>> {
        let mut entries = Vec::new();
        for kind in StatKind::ALL {
            let path = self.path(ticker, kind);
            match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => entries.push(CacheEntry {
                    kind,
                    path,
                    size_bytes: meta.len(),
                }),
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(Error::Io(format!("Failed to stat {}: {}", path.display(), e)));
                }
            }
        }
        Ok(entries)
    }
}

fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = Vec::with_capacity(table.columns().len() + 1);
    header.push("");
    header.extend(table.columns().iter().map(String::as_str));
    writer.write_record(&header)?;

    for (idx, row) in table.indexed_rows() {
        let idx = idx.to_string();
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(idx.as_str());
        record.extend(row.iter().map(String::as_str));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
