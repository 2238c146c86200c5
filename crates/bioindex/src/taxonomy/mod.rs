//! Taxon name resolution.
//!
//! Community-composition entries carry opaque identifiers such as NCBI
//! taxids. This module maps them to readable names through an external
//! service:
//!
//! - [`TaxonomyService`] is the narrow lookup interface, one batch at a time
//! - [`HttpTaxonomyService`] talks to the taxonomy service over HTTP
//! - [`TaxonomyResolver`] deduplicates keys, splits them into batches, runs
//!   the batches concurrently and caches the answers for one conversion
//!
//! Resolution is best-effort. Failed batches leave their keys unresolved and
//! are reported in [`ResolutionReport::failures`].
//!
//! # Example
//!
//! ```no_run
//! use bioindex::taxonomy::{HttpTaxonomyService, ResolverConfig, TaxonomyResolver};
//! use bioindex::Bioindex;
//!
//! # async fn example() -> bioindex::Result<()> {
//! let bioindex = Bioindex::from_path("bioindex.json")?;
//! let service = HttpTaxonomyService::new(bioindex::DEFAULT_TAXONOMY_URL)?;
//! let mut resolver = TaxonomyResolver::new(service, ResolverConfig::default());
//!
//! let report = resolver.resolve(bioindex.taxon_keys()).await;
//! println!("resolved {} of {}", report.resolved, report.requested);
//! # Ok(())
//! # }
//! ```

mod mock;
mod resolver;
mod service;

pub use mock::{FailingTaxonomyService, StaticTaxonomyService};
pub use resolver::{ResolutionReport, ResolverConfig, TaxonomyResolver};
pub use service::{HttpTaxonomyService, TaxonomyService, DEFAULT_TAXONOMY_URL};
