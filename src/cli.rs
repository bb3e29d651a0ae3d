//! Command-line interface parsing for ec2-price
//!
//! This module handles parsing of CLI arguments using clap. The four query
//! flags select the instance configuration; the remaining flags override the
//! pricing configuration. Every flag can also be set through an `EC2_PRICE_*`
//! environment variable.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::config::{
    default_cache_dir, PricingConfig, DEFAULT_CATALOG_URL, DEFAULT_CURRENCY,
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_LOCATION, DEFAULT_MAX_AGE_SECS,
};
use crate::data::Query;

pub const DEFAULT_INSTANCE_TYPE: &str = "m4.4xlarge";
pub const DEFAULT_TENANCY: &str = "Shared";
pub const DEFAULT_OPERATING_SYSTEM: &str = "Linux";
pub const DEFAULT_TERM: &str = "OnDemand";

/// Error types for CLI argument parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// A query flag was given an empty value
    #[error("Invalid --{0}: value must not be empty")]
    EmptyArgument(&'static str),
}

/// ec2-price - Look up the hourly price of an EC2 instance type
#[derive(Parser, Debug)]
#[command(name = "ec2-price")]
#[command(about = "Look up the on-demand hourly price of an EC2 instance type")]
#[command(version)]
pub struct Cli {
    /// EC2 instance type
    #[arg(long = "type", value_name = "TYPE", env = "EC2_PRICE_TYPE", default_value = DEFAULT_INSTANCE_TYPE)]
    pub instance_type: String,

    /// EC2 tenancy type
    #[arg(long, env = "EC2_PRICE_TENANCY", default_value = DEFAULT_TENANCY)]
    pub tenancy: String,

    /// EC2 operating system
    #[arg(long = "os", value_name = "OS", env = "EC2_PRICE_OS", default_value = DEFAULT_OPERATING_SYSTEM)]
    pub operating_system: String,

    /// EC2 pricing term
    #[arg(long, env = "EC2_PRICE_TERM", default_value = DEFAULT_TERM)]
    pub term: String,

    /// Location the product must be offered in
    #[arg(long, env = "EC2_PRICE_LOCATION", default_value = DEFAULT_LOCATION)]
    pub location: String,

    /// Pricing catalog URL
    ///
    /// The cached catalog is not keyed by URL: after changing it, clear the
    /// cache directory or wait for the cache to expire.
    #[arg(long, env = "EC2_PRICE_URL", default_value = DEFAULT_CATALOG_URL)]
    pub url: String,

    /// Directory for the cached catalog and prices [default: platform cache dir]
    #[arg(long, value_name = "DIR", env = "EC2_PRICE_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Maximum age of cached data, in seconds
    #[arg(long = "max-age", value_name = "SECONDS", env = "EC2_PRICE_MAX_AGE", default_value_t = DEFAULT_MAX_AGE_SECS)]
    pub max_age_secs: u64,

    /// Catalog download timeout, in seconds
    #[arg(long = "timeout", value_name = "SECONDS", env = "EC2_PRICE_TIMEOUT", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Preferred currencies, in order (comma-separated)
    #[arg(long = "currency", value_name = "CODES", env = "EC2_PRICE_CURRENCY", value_delimiter = ',', default_value = DEFAULT_CURRENCY)]
    pub currencies: Vec<String>,
}

impl Cli {
    /// Builds the price query from the parsed flags
    ///
    /// # Returns
    /// * `Ok(Query)` if every query flag is non-empty
    /// * `Err(CliError::EmptyArgument)` naming the first empty flag
    pub fn query(&self) -> Result<Query, CliError> {
        let fields = [
            ("type", &self.instance_type),
            ("tenancy", &self.tenancy),
            ("os", &self.operating_system),
            ("term", &self.term),
        ];
        if let Some((flag, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(CliError::EmptyArgument(*flag));
        }

        Ok(Query::new(
            self.instance_type.clone(),
            self.tenancy.clone(),
            self.operating_system.clone(),
            self.term.clone(),
        ))
    }

    /// Builds the pricing configuration from the parsed flags
    pub fn config(&self) -> PricingConfig {
        PricingConfig {
            catalog_url: self.url.clone(),
            location: self.location.clone(),
            cache_dir: self.cache_dir.clone().unwrap_or_else(default_cache_dir),
            max_age: Duration::from_secs(self.max_age_secs),
            fetch_timeout: Duration::from_secs(self.timeout_secs),
            preferred_currencies: self
                .currencies
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args_uses_defaults() {
        let cli = Cli::parse_from(["ec2-price"]);
        assert_eq!(cli.instance_type, "m4.4xlarge");
        assert_eq!(cli.tenancy, "Shared");
        assert_eq!(cli.operating_system, "Linux");
        assert_eq!(cli.term, "OnDemand");
        assert_eq!(cli.location, "US West (Oregon)");
        assert_eq!(cli.max_age_secs, 86_400);
        assert_eq!(cli.currencies, vec!["USD".to_string()]);
    }

    #[test]
    fn test_cli_parse_query_flags() {
        let cli = Cli::parse_from([
            "ec2-price",
            "--type",
            "c5.large",
            "--tenancy",
            "Dedicated",
            "--os",
            "Windows",
            "--term",
            "Reserved",
        ]);
        let query = cli.query().unwrap();
        assert_eq!(query, Query::new("c5.large", "Dedicated", "Windows", "Reserved"));
    }

    #[test]
    fn test_query_rejects_empty_value() {
        let cli = Cli::parse_from(["ec2-price", "--os", ""]);
        assert_eq!(cli.query(), Err(CliError::EmptyArgument("os")));
    }

    #[test]
    fn test_empty_argument_message() {
        let err = CliError::EmptyArgument("tenancy");
        assert!(err.to_string().contains("--tenancy"));
    }

    #[test]
    fn test_config_from_flags() {
        let cli = Cli::parse_from([
            "ec2-price",
            "--cache-dir",
            "/tmp/ec2-cache",
            "--max-age",
            "60",
            "--timeout",
            "5",
            "--location",
            "EU (Ireland)",
            "--url",
            "http://localhost:8080/index.json",
            "--currency",
            "EUR, USD",
        ]);
        let config = cli.config();

        assert_eq!(config.cache_dir, PathBuf::from("/tmp/ec2-cache"));
        assert_eq!(config.max_age, Duration::from_secs(60));
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.location, "EU (Ireland)");
        assert_eq!(config.catalog_url, "http://localhost:8080/index.json");
        assert_eq!(
            config.preferred_currencies,
            vec!["EUR".to_string(), "USD".to_string()]
        );
    }

    #[test]
    fn test_config_defaults_match_pricing_config() {
        let cli = Cli::parse_from(["ec2-price"]);
        assert_eq!(cli.config(), PricingConfig::default());
    }

    #[test]
    fn test_cli_rejects_non_numeric_max_age() {
        let result = Cli::try_parse_from(["ec2-price", "--max-age", "soon"]);
        assert!(result.is_err());
    }
}
