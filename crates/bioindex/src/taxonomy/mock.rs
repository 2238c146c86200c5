//! Deterministic taxonomy services for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ResolutionError;
use crate::model::TaxonKey;

use super::service::TaxonomyService;

/// Service that answers from a fixed name table.
///
/// Counts the batches and keys it was asked for, and the most batches it
/// served at once, so tests can assert on batching, caching and the
/// concurrency bound.
#[derive(Debug, Default)]
pub struct StaticTaxonomyService {
    names: HashMap<String, String>,
    delay: Option<Duration>,
    key_delays: HashMap<String, Duration>,
    batches: AtomicUsize,
    keys_requested: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StaticTaxonomyService {
    /// Create an empty service; every key is unresolved.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `key -> name` entry.
    pub fn with_name(mut self, key: impl Into<String>, name: impl Into<String>) -> Self {
        self.names.insert(key.into(), name.into());
        self
    }

    /// Sleep before answering each batch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep for `delay` before answering any batch containing `key`.
    ///
    /// A batch waits for the longest delay among its keys, overriding
    /// [`with_delay`](Self::with_delay).
    pub fn with_key_delay(mut self, key: impl Into<String>, delay: Duration) -> Self {
        self.key_delays.insert(key.into(), delay);
        self
    }

    /// Most batches that were being served at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Number of batches served so far.
    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    /// Number of keys requested across all batches.
    pub fn keys_requested(&self) -> usize {
        self.keys_requested.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaxonomyService for StaticTaxonomyService {
    async fn resolve_batch(
        &self,
        keys: &[TaxonKey],
    ) -> Result<HashMap<TaxonKey, String>, ResolutionError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.keys_requested.fetch_add(keys.len(), Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = keys
            .iter()
            .filter_map(|k| self.key_delays.get(&k.key).copied())
            .max()
            .or(self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(keys
            .iter()
            .filter_map(|k| self.names.get(&k.key).map(|name| (k.clone(), name.clone())))
            .collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Service whose every batch fails with a network error.
#[derive(Debug, Default)]
pub struct FailingTaxonomyService {
    batches: AtomicUsize,
}

impl FailingTaxonomyService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches attempted so far.
    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaxonomyService for FailingTaxonomyService {
    async fn resolve_batch(
        &self,
        _keys: &[TaxonKey],
    ) -> Result<HashMap<TaxonKey, String>, ResolutionError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        Err(ResolutionError::Network("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
