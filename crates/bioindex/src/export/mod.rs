//! Persisting and handing back table sets.
//!
//! Sinks consume a finished [`TableSet`](crate::TableSet); the pipeline does
//! not depend on which one is used.
//!
//! - [`JsonSink`]: one JSON document keyed by table name
//! - [`DelimitedSink`]: one CSV/TSV file per table
//! - [`MemorySink`]: keeps the tables for programmatic use
//!
//! Column names can be translated on the way out with a [`Locale`]; the
//! tables themselves are never modified.

mod delimited;
mod json;
mod locale;
mod sink;

pub use delimited::{Delimiter, DelimitedSink};
pub use json::{write_document, JsonSink};
pub use locale::{translate, translate_table, Locale};
pub use sink::{document, ExportSink, MemorySink};
