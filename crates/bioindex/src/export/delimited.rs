//! One delimited file per table.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::SinkError;
use crate::tabular::{Table, TableSet};

use super::locale::{translate_table, Locale};
use super::sink::ExportSink;

/// Field separator for delimited output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delimiter {
    #[default]
    Tab,
    Comma,
}

impl Delimiter {
    pub fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Delimiter::Tab => "tsv",
            Delimiter::Comma => "csv",
        }
    }
}

/// Writes each table to `<dir>/<table>.<tsv|csv>`.
///
/// Headers are the table's declared columns; a column a row does not carry
/// (e.g. `group` outside biological fertility) is left empty, as is a null
/// value.
#[derive(Debug, Clone)]
pub struct DelimitedSink {
    dir: PathBuf,
    delimiter: Delimiter,
    locale: Locale,
}

impl DelimitedSink {
    pub fn new(dir: impl Into<PathBuf>, delimiter: Delimiter) -> Self {
        Self {
            dir: dir.into(),
            delimiter,
            locale: Locale::default(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the given table is written to.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", table, self.delimiter.extension()))
    }

    fn write_table(&self, table: &Table) -> Result<(), SinkError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter.as_byte())
            .from_path(self.table_path(table.name))?;

        writer.write_record(&table.columns)?;
        for record in &table.records {
            writer.write_record(
                table
                    .columns
                    .iter()
                    .map(|c| cell(record.get(c).unwrap_or(&Value::Null))),
            )?;
        }
        writer.flush().map_err(|e| SinkError::Io {
            path: self.table_path(table.name),
            source: e,
        })?;
        Ok(())
    }
}

impl ExportSink for DelimitedSink {
    fn write(&mut self, tables: &TableSet) -> Result<(), SinkError> {
        fs::create_dir_all(&self.dir).map_err(|e| SinkError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        for table in tables.tables()? {
            let table = translate_table(table, self.locale);
            self.write_table(&table)?;
            tracing::debug!(table = table.name, rows = table.len(), "table written");
        }
        Ok(())
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
