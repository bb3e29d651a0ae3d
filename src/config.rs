//! Policy configuration for price lookups
//!
//! Everything that used to be a process-wide constant (catalog URL, location,
//! cache directory, freshness window) lives in a `PricingConfig` value that is
//! handed to each component when it is constructed.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

/// AWS Price List bulk offer file for EC2
pub const DEFAULT_CATALOG_URL: &str =
    "https://pricing.us-east-1.amazonaws.com/offers/v1.0/aws/AmazonEC2/current/index.json";

/// Location attribute every matching product must carry
pub const DEFAULT_LOCATION: &str = "US West (Oregon)";

/// Freshness window for both the catalog and per-query results (24 hours)
pub const DEFAULT_MAX_AGE_SECS: u64 = 86_400;

/// Upper bound on a single catalog download
///
/// The EC2 offer file is several gigabytes, so this is generous.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 600;

/// Currency picked first when a price dimension lists several
pub const DEFAULT_CURRENCY: &str = "USD";

/// Cache directory used when no platform cache directory can be determined
const FALLBACK_CACHE_DIR: &str = ".aws_pricing";

/// Configuration shared by the catalog client and the price client
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    /// Where the catalog is downloaded from
    pub catalog_url: String,
    /// Value the `location` product attribute must equal
    pub location: String,
    /// Directory holding the catalog snapshot and per-query results
    pub cache_dir: PathBuf,
    /// Maximum age of a cached blob that is still served
    pub max_age: Duration,
    /// Timeout applied to the catalog download
    pub fetch_timeout: Duration,
    /// Currencies in order of preference
    pub preferred_currencies: Vec<String>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            cache_dir: default_cache_dir(),
            max_age: Duration::from_secs(DEFAULT_MAX_AGE_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            preferred_currencies: vec![DEFAULT_CURRENCY.to_string()],
        }
    }
}

impl PricingConfig {
    /// Returns a default configuration rooted at the given cache directory
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }
}

/// Returns the XDG-compliant cache directory (`~/.cache/ec2-price/` on Linux)
///
/// Falls back to `<tmp>/.aws_pricing` when there is no home directory.
pub fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", "ec2-price")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(FALLBACK_CACHE_DIR))
}
