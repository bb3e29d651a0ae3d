//! AWS Price List catalog client
//!
//! Downloads the EC2 offer file and keeps a snapshot of the raw bytes in the
//! cache, so that the multi-gigabyte download happens at most once per
//! freshness window.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use super::Catalog;
use crate::cache::{CacheManager, StoreError, CATALOG_KEY};
use crate::config::PricingConfig;

/// Errors that can occur when obtaining the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Transport error, non-success status or truncated body
    #[error("Failed to fetch catalog from {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    /// The download did not finish within the configured timeout
    #[error("Timed out fetching catalog from {url}")]
    FetchTimeout { url: String },

    /// The catalog bytes do not match the expected schema
    #[error("Malformed catalog: {0}")]
    MalformedCatalog(#[from] serde_json::Error),

    /// Cache read/write error
    #[error("Catalog cache error: {0}")]
    Store(#[from] StoreError),
}

impl CatalogError {
    fn from_transport(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::FetchTimeout {
                url: url.to_string(),
            }
        } else {
            Self::FetchFailed {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Something that can download the catalog bytes
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    /// Fetches the full response body for `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CatalogError>;
}

/// Catalog source backed by a reqwest HTTP client
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Creates a source whose requests are bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CatalogError::Client)?;
        Ok(Self { client })
    }
}

impl CatalogSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| CatalogError::from_transport(url, e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| CatalogError::from_transport(url, e))?;

        Ok(body.into())
    }
}

/// Parses raw catalog bytes
pub fn decode_catalog(bytes: &[u8]) -> Result<Catalog, CatalogError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Client that serves the catalog from cache or from the network
#[derive(Debug, Clone)]
pub struct CatalogClient<S = HttpSource> {
    source: S,
    cache: CacheManager,
    url: String,
    max_age: Duration,
}

impl CatalogClient<HttpSource> {
    /// Creates a client that downloads over HTTP using the given configuration
    pub fn new(config: &PricingConfig) -> Result<Self, CatalogError> {
        let source = HttpSource::new(config.fetch_timeout)?;
        Ok(Self::with_source(config, source))
    }
}

impl<S: CatalogSource> CatalogClient<S> {
    /// Creates a client with a custom catalog source
    pub fn with_source(config: &PricingConfig, source: S) -> Self {
        Self {
            source,
            cache: CacheManager::with_dir(&config.cache_dir),
            url: config.catalog_url.clone(),
            max_age: config.max_age,
        }
    }

    /// Returns the underlying catalog source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns how long ago the catalog snapshot was written, if there is one
    pub fn snapshot_age(&self) -> Option<TimeDelta> {
        let modified = self.cache.modified_at(CATALOG_KEY)?;
        Some(Utc::now().signed_duration_since(modified))
    }

    /// Returns the raw catalog bytes
    ///
    /// # Behavior
    /// - If the cached snapshot is younger than the freshness window, returns it
    /// - Otherwise downloads the catalog and overwrites the snapshot before
    ///   returning the bytes
    /// - Download failures are returned as-is, without retrying
    pub async fn fetch_catalog_bytes(&self) -> Result<Vec<u8>, CatalogError> {
        if self.cache.has_fresh(CATALOG_KEY, self.max_age) {
            match self.cache.read(CATALOG_KEY) {
                Ok(bytes) => {
                    let age_secs = self.snapshot_age().map(|age| age.num_seconds());
                    info!(
                        path = %self.cache.cache_path(CATALOG_KEY).display(),
                        age_secs,
                        "Reading catalog from cache"
                    );
                    return Ok(bytes);
                }
                // Removed between the freshness check and the read
                Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        info!(url = %self.url, "Fetching catalog from AWS Price List API");
        let bytes = self.source.fetch(&self.url).await?;
        debug!(len = bytes.len(), "Downloaded catalog");

        self.cache.write(CATALOG_KEY, &bytes)?;
        Ok(bytes)
    }

    /// Returns the decoded catalog
    ///
    /// A corrupt snapshot keeps failing to decode until it goes stale.
    pub async fn get_catalog(&self) -> Result<Catalog, CatalogError> {
        let bytes = self.fetch_catalog_bytes().await?;
        decode_catalog(&bytes)
    }
}
