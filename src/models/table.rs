//! Tabular result of a statistics fetch.
//!
//! Cells are kept as provider text so a table survives a CSV round trip
//! unchanged. Row position is the only index.

use crate::error::{Error, Result};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, rejecting rows whose width differs from the header
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(Error::InvalidInput(format!(
                "Row {} has {} cells, expected {}",
                idx,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from an ISS block: `{"columns": [...], "data": [[...], ...]}`
    pub fn from_iss_block(block: &Value) -> Result<Self> {
        let columns = block
            .get("columns")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::InvalidResponse("Missing key: columns".to_string()))?
            .iter()
            .map(|c| {
                c.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::InvalidResponse(format!("Invalid column name: {}", c)))
            })
            .collect::<Result<Vec<_>>>()?;

        let data = block
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::InvalidResponse("Missing key: data".to_string()))?;

        let mut rows = Vec::with_capacity(data.len());
        for (idx, row) in data.iter().enumerate() {
            let cells = row
                .as_array()
                .ok_or_else(|| Error::InvalidResponse(format!("Row {} is not an array", idx)))?;
            if cells.len() != columns.len() {
                return Err(Error::InvalidResponse(format!(
                    "Inconsistent row length at {}: {} cells for {} columns",
                    idx,
                    cells.len(),
                    columns.len()
                )));
            }
            rows.push(cells.iter().map(cell_text).collect());
        }

        Ok(Self { columns, rows })
    }

    /// Stack pages vertically, aligning cells by column name.
    ///
    /// The result holds the union of all page columns in first-seen order;
    /// a page lacking a column gets empty cells there. Row numbering is
    /// positional, so the result is numbered 0..n.
    pub fn concat(pages: Vec<Table>) -> Result<Self> {
        let mut columns: Vec<String> = Vec::new();
        for page in &pages {
            for column in &page.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let total_rows = pages.iter().map(Table::len).sum();
        let mut rows = Vec::with_capacity(total_rows);
        for page in pages {
            if page.columns == columns {
                rows.extend(page.rows);
                continue;
            }

            // Position of each output column within this page
            let positions: Vec<Option<usize>> =
                columns.iter().map(|c| page.column_index(c)).collect();
            for row in page.rows {
                rows.push(
                    positions
                        .iter()
                        .map(|pos| pos.and_then(|i| row.get(i)).cloned().unwrap_or_default())
                        .collect(),
                );
            }
        }

        Table::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell of the final row in the named column
    pub fn last_value(&self, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.last().and_then(|row| row.get(idx)).map(String::as_str)
    }

    /// Rows paired with their zero-based position
    pub fn indexed_rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows.iter().map(Vec::as_slice).enumerate()
    }
}

/// Render a JSON cell as text; null becomes an empty cell
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
