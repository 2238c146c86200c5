//! Single-document JSON export.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::SinkError;
use crate::tabular::TableSet;

use super::locale::Locale;
use super::sink::{document, ExportSink};

/// Writes all six tables as one pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
    locale: Locale,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            locale: Locale::default(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportSink for JsonSink {
    fn write(&mut self, tables: &TableSet) -> Result<(), SinkError> {
        let path = self.path.as_path();
        let io_err = |e| SinkError::Io {
            path: path.to_path_buf(),
            source: e,
        };

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| SinkError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        write_document(tables, self.locale, &mut writer)?;
        writer.flush().map_err(io_err)?;
        Ok(())
    }
}

/// Write the output document to any writer.
pub fn write_document<W: Write>(
    tables: &TableSet,
    locale: Locale,
    writer: W,
) -> Result<(), SinkError> {
    let doc = document(tables, locale)?;
    serde_json::to_writer_pretty(writer, &doc)?;
    Ok(())
}
