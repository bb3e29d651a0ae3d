//! Price lookups with a per-query result cache
//!
//! A resolved price is stored as an 8-byte blob named after the query's
//! cache key. While that blob is fresh, repeated lookups skip the catalog
//! download, decoding and scanning entirely. Failed lookups are never cached.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CacheManager, StoreError};
use crate::config::PricingConfig;
use crate::data::{
    CatalogClient, CatalogError, CatalogSource, EntryResolver, HttpSource, Query, ResolveError,
};

/// Errors that can occur when looking up a price
#[derive(Debug, Error)]
pub enum PriceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Cache read/write error for the per-query result
    #[error("Price cache error: {0}")]
    Store(#[from] StoreError),

    /// No product matches the query
    #[error("No SKU found for {0}")]
    SkuNotFound(Query),

    /// The catalog price is not a finite decimal number
    #[error("Invalid price '{value}' for SKU {sku}")]
    InvalidPriceFormat { sku: String, value: String },
}

impl PriceError {
    /// Whether the query simply has no price in the catalog
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SkuNotFound(_) | Self::Resolve(ResolveError::PriceNotFound { .. })
        )
    }
}

/// Client for looking up EC2 prices
///
/// Ties together the catalog client, the entry resolver and the per-query
/// result cache.
#[derive(Debug, Clone)]
pub struct PriceClient<S = HttpSource> {
    catalog: CatalogClient<S>,
    resolver: EntryResolver,
    cache: CacheManager,
    max_age: Duration,
}

impl PriceClient<HttpSource> {
    /// Creates a client that downloads the catalog over HTTP
    pub fn new(config: &PricingConfig) -> Result<Self, PriceError> {
        let catalog = CatalogClient::new(config)?;
        Ok(Self::with_catalog(config, catalog))
    }
}

impl<S: CatalogSource> PriceClient<S> {
    /// Creates a client with a custom catalog source
    pub fn with_source(config: &PricingConfig, source: S) -> Self {
        Self::with_catalog(config, CatalogClient::with_source(config, source))
    }

    fn with_catalog(config: &PricingConfig, catalog: CatalogClient<S>) -> Self {
        Self {
            catalog,
            resolver: EntryResolver::from_config(config),
            cache: CacheManager::with_dir(&config.cache_dir),
            max_age: config.max_age,
        }
    }

    /// Returns the catalog client used on cache misses
    pub fn catalog_client(&self) -> &CatalogClient<S> {
        &self.catalog
    }

    /// Looks up the hourly price for a query
    ///
    /// # Behavior
    /// - Returns the cached result if it is younger than the freshness window
    /// - Otherwise fetches and decodes the catalog, resolves the SKU and its
    ///   price, and overwrites the cached result
    /// - Errors are returned unchanged and nothing is cached for them
    pub async fn get_price(&self, query: &Query) -> Result<f64, PriceError> {
        let key = CacheKey::for_query(query);

        if let Some(price) = self.read_cached(&key)? {
            return Ok(price);
        }

        let price = self.resolve(query).await?;
        self.cache.write_f64(key.as_str(), price)?;
        debug!(%key, price, "Cached resolved price");

        Ok(price)
    }

    fn read_cached(&self, key: &CacheKey) -> Result<Option<f64>, PriceError> {
        if !self.cache.has_fresh(key.as_str(), self.max_age) {
            debug!(%key, "No fresh cached price");
            return Ok(None);
        }

        match self.cache.read_f64(key.as_str()) {
            Ok(Some(price)) => {
                info!(path = %self.cache.cache_path(key.as_str()).display(), "Reading price from cache");
                Ok(Some(price))
            }
            Ok(None) => {
                warn!(%key, "Ignoring cached price with unexpected size");
                Ok(None)
            }
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve(&self, query: &Query) -> Result<f64, PriceError> {
        let catalog = self.catalog.get_catalog().await?;

        let sku = self
            .resolver
            .resolve_sku(
                &catalog,
                &query.instance_type,
                &query.tenancy,
                &query.operating_system,
            )?
            .ok_or_else(|| PriceError::SkuNotFound(query.clone()))?;
        debug!(%sku, "Resolved SKU");

        let price = self.resolver.resolve_price(&catalog, &sku, &query.term)?;
        debug!(%sku, currency = %price.currency, value = %price.value, "Resolved price");

        parse_price(&sku, &price.value)
    }
}

/// Parses a catalog price string into a finite number
pub fn parse_price(sku: &str, value: &str) -> Result<f64, PriceError> {
    match value.parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(price),
        _ => Err(PriceError::InvalidPriceFormat {
            sku: sku.to_string(),
            value: value.to_string(),
        }),
    }
}
