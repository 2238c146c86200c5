//! Export sink trait and the in-memory sink.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::SinkError;
use crate::tabular::{InfoRow, Row, TableSet};

use super::locale::{translate_table, Locale};

/// Destination for a finished table set.
///
/// A failed write leaves the table set untouched, so callers can retry with
/// the same or another sink.
pub trait ExportSink {
    fn write(&mut self, tables: &TableSet) -> Result<(), SinkError>;
}

/// Build the output document with column names in `locale`.
///
/// `info` becomes an object and every other table an ordered list of row
/// objects. With [`Locale::EnUs`] this equals [`TableSet::to_document`].
pub fn document(tables: &TableSet, locale: Locale) -> Result<Value, SinkError> {
    let mut doc: IndexMap<&str, Value> = IndexMap::new();
    for table in tables.tables()? {
        let table = translate_table(table, locale);
        let value = if table.name == InfoRow::TABLE {
            table
                .records
                .into_iter()
                .next()
                .map(|r| Value::Object(r.into_iter().collect()))
                .unwrap_or(Value::Null)
        } else {
            Value::Array(
                table
                    .records
                    .into_iter()
                    .map(|r| Value::Object(r.into_iter().collect()))
                    .collect(),
            )
        };
        doc.insert(table.name, value);
    }
    Ok(serde_json::to_value(doc)?)
}

/// Sink that keeps the last table set written to it.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: Option<TableSet>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> Option<&TableSet> {
        self.tables.as_ref()
    }

    pub fn into_tables(self) -> Option<TableSet> {
        self.tables
    }
}

impl ExportSink for MemorySink {
    fn write(&mut self, tables: &TableSet) -> Result<(), SinkError> {
        self.tables = Some(tables.clone());
        Ok(())
    }
}
