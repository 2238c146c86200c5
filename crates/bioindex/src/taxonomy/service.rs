//! Taxonomy service trait and HTTP implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;

use crate::error::ResolutionError;
use crate::model::TaxonKey;

/// Default taxonomy service endpoint.
pub const DEFAULT_TAXONOMY_URL: &str = "https://taxonomy.agrobiota.com/api/v1/resolve";

/// Per-request timeout for the HTTP client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A source of taxon names.
///
/// Implementations must be thread-safe (Send + Sync): the resolver issues
/// batches from concurrent tasks.
#[async_trait]
pub trait TaxonomyService: Send + Sync {
    /// Resolve one batch of keys.
    ///
    /// Keys missing from the returned map are unresolved; that is not an
    /// error. An `Err` marks the whole batch as failed.
    ///
    /// The resolver never mixes key types in one batch, so a service may
    /// answer by `key` alone.
    async fn resolve_batch(
        &self,
        keys: &[TaxonKey],
    ) -> Result<HashMap<TaxonKey, String>, ResolutionError>;

    /// Get the name of this service (for logging/debugging).
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct ResolveRequest<'a> {
    keys: &'a [TaxonKey],
}

/// Taxonomy service reached over HTTP.
///
/// Each batch is a `POST` of `{"keys": [{"key", "keyType"}, ...]}`; the
/// service answers with a JSON object mapping each known key to its name.
pub struct HttpTaxonomyService {
    client: Client,
    url: Url,
}

impl HttpTaxonomyService {
    /// Create a service for the given endpoint.
    ///
    /// Fails with [`ResolutionError::UnknownEndpoint`] if the URL does not
    /// parse or is not http(s).
    pub fn new(url: &str) -> Result<Self, ResolutionError> {
        let url = Url::parse(url).map_err(|e| {
            ResolutionError::UnknownEndpoint(format!("{} ({})", url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ResolutionError::UnknownEndpoint(format!(
                "{} (unsupported scheme '{}')",
                url,
                url.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ResolutionError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

#[async_trait]
impl TaxonomyService for HttpTaxonomyService {
    async fn resolve_batch(
        &self,
        keys: &[TaxonKey],
    ) -> Result<HashMap<TaxonKey, String>, ResolutionError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&ResolveRequest { keys })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ResolutionError::UnknownEndpoint(self.url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolutionError::Network(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        let body: Value = response.json().await?;
        parse_names(keys, body)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Pick the requested keys out of a `key -> name` response object.
fn parse_names(
    keys: &[TaxonKey],
    body: Value,
) -> Result<HashMap<TaxonKey, String>, ResolutionError> {
    let Value::Object(names) = body else {
        return Err(ResolutionError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            kind_of(&body)
        )));
    };

    Ok(keys
        .iter()
        .filter_map(|key| match names.get(&key.key) {
            Some(Value::String(name)) if !name.is_empty() => Some((key.clone(), name.clone())),
            _ => None,
        })
        .collect())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
