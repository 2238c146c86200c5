//! Main Converter struct and public API.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{BioindexError, Result};
use crate::export::ExportSink;
use crate::model::Bioindex;
use crate::tabular::{tabularize, TableSet};
use crate::taxonomy::{
    HttpTaxonomyService, ResolutionReport, ResolverConfig, TaxonomyResolver, TaxonomyService,
    DEFAULT_TAXONOMY_URL,
};

/// Environment variable overriding the taxonomy service URL.
pub const TAXONOMY_URL_ENV: &str = "TAXONOMY_URL";

/// Configuration for a conversion.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Look up taxon names for community-composition entries.
    pub resolve_taxonomies: bool,
    /// Taxonomy service endpoint.
    pub taxonomy_url: String,
    /// Abort on resolution errors instead of leaving taxa unresolved.
    pub strict_resolution: bool,
    /// Batching, concurrency and timeout of the resolver stage.
    pub resolver: ResolverConfig,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            resolve_taxonomies: true,
            taxonomy_url: DEFAULT_TAXONOMY_URL.to_string(),
            strict_resolution: false,
            resolver: ResolverConfig::default(),
        }
    }
}

impl ConvertConfig {
    /// Defaults, with the taxonomy URL taken from `TAXONOMY_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(TAXONOMY_URL_ENV) {
            if !url.trim().is_empty() {
                config.taxonomy_url = url;
            }
        }
        config
    }

    pub fn with_resolve_taxonomies(mut self, resolve: bool) -> Self {
        self.resolve_taxonomies = resolve;
        self
    }

    pub fn with_taxonomy_url(mut self, url: impl Into<String>) -> Self {
        self.taxonomy_url = url.into();
        self
    }

    pub fn with_strict_resolution(mut self, strict: bool) -> Self {
        self.strict_resolution = strict;
        self
    }

    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.resolver.timeout = timeout;
        self
    }

    /// Reject settings the resolver cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.resolver.batch_size == 0 {
            return Err(BioindexError::Config("batch size must be at least 1".to_string()));
        }
        if self.resolver.concurrency == 0 {
            return Err(BioindexError::Config("concurrency must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Result of converting one record.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The six derived tables.
    pub tables: TableSet,
    /// What the resolver stage did; `None` when resolution was skipped.
    pub resolution: Option<ResolutionReport>,
    /// Degradations that did not stop the conversion.
    pub warnings: Vec<String>,
}

impl Conversion {
    /// Hand the tables to a sink.
    ///
    /// The conversion is kept on failure, so the export can be retried
    /// without converting again.
    pub fn export(&self, sink: &mut dyn ExportSink) -> Result<()> {
        sink.write(&self.tables)?;
        Ok(())
    }
}

/// Drives validation, taxonomy resolution and tabularization.
///
/// # Example
///
/// ```no_run
/// use bioindex::{Bioindex, ConvertConfig, Converter};
///
/// # async fn example() -> bioindex::Result<()> {
/// let bioindex = Bioindex::from_path("bioindex.json")?;
/// let converter = Converter::with_config(ConvertConfig::from_env());
///
/// let conversion = converter.convert(bioindex).await?;
/// for warning in &conversion.warnings {
///     eprintln!("warning: {}", warning);
/// }
/// println!("{} samples", conversion.tables.by_sample.len());
/// # Ok(())
/// # }
/// ```
pub struct Converter {
    config: ConvertConfig,
    service: Option<Arc<dyn TaxonomyService>>,
}

impl Converter {
    /// Create a converter with default configuration.
    pub fn new() -> Self {
        Self::with_config(ConvertConfig::default())
    }

    /// Create a converter with custom configuration.
    pub fn with_config(config: ConvertConfig) -> Self {
        Self {
            config,
            service: None,
        }
    }

    /// Use the given taxonomy service instead of the HTTP one built from
    /// `taxonomy_url`.
    pub fn with_taxonomy_service(mut self, service: impl TaxonomyService + 'static) -> Self {
        self.service = Some(Arc::new(service));
        self
    }

    /// Use a shared taxonomy service.
    pub fn with_shared_taxonomy_service(mut self, service: Arc<dyn TaxonomyService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Convert a record into its table set.
    ///
    /// Fails on an invalid configuration or record, and on resolution errors
    /// only in strict mode. Tabularization starts after every resolver batch has settled.
    pub async fn convert(&self, mut bioindex: Bioindex) -> Result<Conversion> {
        self.config.validate()?;
        bioindex.validate()?;

        let mut warnings = Vec::new();
        let resolution = if self.config.resolve_taxonomies {
            self.resolve(&mut bioindex, &mut warnings).await?
        } else {
            None
        };

        let tables = tabularize(&bioindex)?;

        tracing::info!(
            bioindex = %tables.info.id,
            samples = tables.by_sample.len(),
            rows = tables.row_count(),
            "bioindex converted"
        );

        Ok(Conversion {
            tables,
            resolution,
            warnings,
        })
    }

    async fn resolve(
        &self,
        bioindex: &mut Bioindex,
        warnings: &mut Vec<String>,
    ) -> Result<Option<ResolutionReport>> {
        let service = match self.service_for_run() {
            Ok(service) => service,
            Err(err) if self.config.strict_resolution => return Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "taxonomy resolution disabled");
                warnings.push(format!("taxonomy resolution skipped: {}", err));
                return Ok(None);
            }
        };

        let mut resolver = TaxonomyResolver::from_shared(service, self.config.resolver.clone());
        let report = resolver.resolve(bioindex.taxon_keys()).await;

        if self.config.strict_resolution {
            if let Some(err) = report.failures.first() {
                return Err(BioindexError::Resolution(err.clone()));
            }
        }

        if report.is_degraded() {
            let message = degradation_message(&report);
            tracing::warn!(
                failed_batches = report.failures.len(),
                timed_out = report.timed_out,
                unresolved = report.unresolved(),
                "{}",
                message
            );
            warnings.push(message);
        }

        bioindex.apply_taxa(&report.names);
        Ok(Some(report))
    }

    fn service_for_run(&self) -> Result<Arc<dyn TaxonomyService>> {
        if let Some(ref service) = self.service {
            return Ok(Arc::clone(service));
        }
        let service = HttpTaxonomyService::new(&self.config.taxonomy_url)?;
        Ok(Arc::new(service))
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

fn degradation_message(report: &ResolutionReport) -> String {
    let mut message = format!(
        "{} of {} taxa left unresolved",
        report.unresolved(),
        report.requested
    );
    if let Some(err) = report.failures.first() {
        message.push_str(&format!(
            "; {} batch(es) failed, first error: {}",
            report.failures.len(),
            err
        ));
    }
    if report.timed_out {
        message.push_str("; resolver timed out");
    }
    message
}
