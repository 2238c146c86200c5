//! In-memory representation of a Bioindex record.
//!
//! The types mirror the camelCase JSON produced by the upstream analysis
//! pipeline. A record is deserialized once, checked with
//! [`Bioindex::validate`], optionally enriched with taxon names, and then
//! handed to the tabularizer.
//!
//! # Example
//!
//! ```no_run
//! use bioindex::Bioindex;
//!
//! let bioindex = Bioindex::from_path("bioindex.json").unwrap();
//! bioindex.validate().unwrap();
//!
//! for result in &bioindex.results {
//!     println!("{}: {}", result.sample, result.ggh);
//! }
//! ```

pub mod analysis;
mod record;
mod validate;

pub use analysis::{Analysis, AnalysisList};
pub use record::{
    Bioindex, ByDimension, ByProcess, ByTaxonomy, CommunityComposition, Dimension, DimensionName,
    Diversity, Metric, SampleResult, Statistics, TaxonKey, TaxonStatistics, TaxonomicGroup,
};
