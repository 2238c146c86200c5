//! Batched, cached, concurrent taxon resolution.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use indexmap::{IndexMap, IndexSet};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::error::ResolutionError;
use crate::model::TaxonKey;

use super::service::TaxonomyService;

/// Tuning for the resolver stage.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum keys per service call.
    pub batch_size: usize,
    /// Maximum batches in flight at once.
    pub concurrency: usize,
    /// Bound on the whole resolver stage (None = wait for every batch).
    pub timeout: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            concurrency: 4,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ResolverConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Outcome of one [`TaxonomyResolver::resolve`] call.
#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    /// Unique keys asked for.
    pub requested: usize,
    /// Keys that have a name (from this call or the cache).
    pub resolved: usize,
    /// Keys answered from the cache without a service call.
    pub cached: usize,
    /// Service calls issued.
    pub batches: usize,
    /// One entry per failed batch.
    pub failures: Vec<ResolutionError>,
    /// Whether the stage timeout cut off outstanding batches.
    pub timed_out: bool,
    /// Names for the requested keys that were resolved.
    pub names: HashMap<TaxonKey, String>,
}

impl ResolutionReport {
    /// Keys that remain without a name.
    pub fn unresolved(&self) -> usize {
        self.requested - self.resolved
    }

    /// Whether any batch failed or the stage timed out.
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty() || self.timed_out
    }
}

type BatchOutcome = (usize, Vec<TaxonKey>, Result<HashMap<TaxonKey, String>, ResolutionError>);

/// Resolves taxon keys through a [`TaxonomyService`].
///
/// The cache lives as long as the resolver; create one resolver per
/// conversion. A key is sent to the service at most once per resolver once
/// the service has answered for it, whether or not a name came back.
pub struct TaxonomyResolver {
    service: Arc<dyn TaxonomyService>,
    config: ResolverConfig,
    cache: HashMap<TaxonKey, String>,
    answered: HashSet<TaxonKey>,
}

impl TaxonomyResolver {
    /// Create a resolver that owns its service.
    pub fn new(service: impl TaxonomyService + 'static, config: ResolverConfig) -> Self {
        Self::from_shared(Arc::new(service), config)
    }

    /// Create a resolver over a shared service.
    pub fn from_shared(service: Arc<dyn TaxonomyService>, config: ResolverConfig) -> Self {
        Self {
            service,
            config,
            cache: HashMap::new(),
            answered: HashSet::new(),
        }
    }

    /// Names resolved so far.
    pub fn names(&self) -> &HashMap<TaxonKey, String> {
        &self.cache
    }

    /// Resolve a set of keys.
    ///
    /// Never fails: errors are collected in the report and the affected keys
    /// stay unresolved. Returns only after every batch has settled.
    pub async fn resolve(&mut self, keys: impl IntoIterator<Item = TaxonKey>) -> ResolutionReport {
        let requested: IndexSet<TaxonKey> = keys.into_iter().collect();
        let pending: Vec<TaxonKey> = requested
            .iter()
            .filter(|k| !self.answered.contains(*k))
            .cloned()
            .collect();

        let mut report = ResolutionReport {
            requested: requested.len(),
            cached: requested.len() - pending.len(),
            ..Default::default()
        };

        if !pending.is_empty() {
            self.run_batches(pending, &mut report).await;
        }

        report.names = requested
            .iter()
            .filter_map(|k| self.cache.get(k).map(|name| (k.clone(), name.clone())))
            .collect();
        report.resolved = report.names.len();

        tracing::debug!(
            service = self.service.name(),
            requested = report.requested,
            resolved = report.resolved,
            cached = report.cached,
            batches = report.batches,
            failed = report.failures.len(),
            timed_out = report.timed_out,
            "taxonomy resolution finished"
        );

        report
    }

    async fn run_batches(&mut self, pending: Vec<TaxonKey>, report: &mut ResolutionReport) {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut set: JoinSet<BatchOutcome> = JoinSet::new();

        for (idx, batch) in batches(pending, self.config.batch_size.max(1))
            .into_iter()
            .enumerate()
        {
            let service = Arc::clone(&self.service);
            let semaphore = Arc::clone(&semaphore);
            set.spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail.
                let _permit = semaphore.acquire_owned().await.ok();
                let result = service.resolve_batch(&batch).await;
                (idx, batch, result)
            });
            report.batches += 1;
        }

        // A timeout too large to represent is the same as no timeout.
        let deadline = self
            .config
            .timeout
            .and_then(|t| Instant::now().checked_add(t));

        loop {
            let next = match deadline {
                Some(deadline) => {
                    let outcome = tokio::time::timeout_at(deadline, set.join_next()).await;
                    match outcome {
                        Ok(next) => next,
                        Err(_) => {
                            report.timed_out = true;
                            set.abort_all();
                            break;
                        }
                    }
                }
                None => set.join_next().await,
            };

            let Some(joined) = next else {
                break;
            };
            match joined {
                Ok(outcome) => self.settle(outcome, report),
                Err(err) => {
                    report
                        .failures
                        .push(ResolutionError::Network(format!("batch task failed: {}", err)));
                }
            }
        }

        // Aborted batches must be gone before the names are used. A batch
        // that finished before its abort took effect still counts.
        while let Some(joined) = set.join_next().await {
            if let Ok(outcome) = joined {
                self.settle(outcome, report);
            }
        }
    }

    fn settle(&mut self, (idx, batch, result): BatchOutcome, report: &mut ResolutionReport) {
        match result {
            Ok(names) => {
                tracing::debug!(batch = idx, keys = batch.len(), names = names.len(), "taxonomy batch resolved");
                self.answered.extend(batch);
                self.cache.extend(names);
            }
            Err(err) => {
                tracing::debug!(batch = idx, keys = batch.len(), error = %err, "taxonomy batch failed");
                report.failures.push(err);
            }
        }
    }
}

/// Split keys into batches of at most `size`, never mixing key types, since
/// the service answers by `key` alone.
fn batches(keys: Vec<TaxonKey>, size: usize) -> Vec<Vec<TaxonKey>> {
    let mut by_type: IndexMap<String, Vec<TaxonKey>> = IndexMap::new();
    for key in keys {
        by_type.entry(key.key_type.clone()).or_default().push(key);
    }
    by_type
        .into_values()
        .flat_map(|keys| {
            keys.chunks(size)
                .map(|chunk| chunk.to_vec())
                .collect::<Vec<_>>()
        })
        .collect()
}
