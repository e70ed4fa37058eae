//! CSV output for flat tables

use crate::error::Result;
use crate::normalize::{FlatTable, NormalizedTables};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{error, info};

/// Writes each table to `<dir>/<table name>.csv`
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write one table; empty tables are skipped and return `None`
    pub fn write_table(&self, table: &FlatTable) -> Result<Option<PathBuf>> {
        if table.is_empty() {
            info!(table = table.name(), "Table is empty, not written");
            return Ok(None);
        }

        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.csv", table.name()));

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(table.columns())?;
        for row in 0..table.len() {
            writer.write_record(table.columns().iter().map(|c| cell_text(table.cell(row, c))))?;
        }
        writer.flush()?;

        info!(table = table.name(), rows = table.len(), path = %path.display(), "Table written");
        Ok(Some(path))
    }

    /// Write every non-empty table, stopping at the first failure
    pub fn write_all(&self, tables: &NormalizedTables) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for table in tables.tables() {
            let path = self.write_table(table).inspect_err(|e| {
                error!(table = table.name(), error = %e, "Failed to write table");
            })?;
            written.extend(path);
        }
        Ok(written)
    }
}

/// Text of one CSV cell: strings raw, null empty, other scalars in JSON form
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
