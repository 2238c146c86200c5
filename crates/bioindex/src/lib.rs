//! Bioindex: flattens biodiversity assessment records into correlated tables.
//!
//! A Bioindex scores each soil sample along four dimensions (biodiversity,
//! biological agents, biological fertility, phytosanitary risk) and reports
//! diversity statistics and community composition. This crate turns one
//! record into six tables that share a `sample` column, optionally naming
//! each detected taxon through an external taxonomy service.
//!
//! # Core Principles
//!
//! - **Source order**: rows follow the record; nothing is re-sorted
//! - **All or nothing**: an invalid record produces no tables
//! - **Best-effort enrichment**: taxonomy failures leave `taxon` empty
//!   instead of failing the conversion (unless strict mode is on)
//!
//! # Example
//!
//! ```no_run
//! use bioindex::{Bioindex, ConvertConfig, Converter, JsonSink};
//!
//! # async fn example() -> bioindex::Result<()> {
//! let bioindex = Bioindex::from_path("bioindex.json")?;
//! let converter = Converter::with_config(
//!     ConvertConfig::from_env().with_resolve_taxonomies(false),
//! );
//!
//! let conversion = converter.convert(bioindex).await?;
//! conversion.export(&mut JsonSink::new("bioindex.tables.json"))?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod export;
pub mod model;
pub mod tabular;
pub mod taxonomy;

mod converter;

pub use crate::converter::{Conversion, ConvertConfig, Converter, TAXONOMY_URL_ENV};
pub use error::{BioindexError, InvalidRecordError, ResolutionError, Result, SinkError};
pub use export::{Delimiter, DelimitedSink, ExportSink, JsonSink, Locale, MemorySink};
pub use model::{Bioindex, CommunityComposition, DimensionName, SampleResult, TaxonKey};
pub use tabular::{tabularize, TableSet};
pub use taxonomy::{
    FailingTaxonomyService, ResolverConfig, StaticTaxonomyService, TaxonomyService,
    DEFAULT_TAXONOMY_URL,
};
