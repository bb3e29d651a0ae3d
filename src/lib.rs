//! EC2 price lookup library
//!
//! Resolves the hourly price of an EC2 instance configuration from the AWS
//! Price List catalog, caching both the catalog and each resolved price on
//! disk. The modules are exposed for use by the binary and integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod pricing;

pub use config::PricingConfig;
pub use data::Query;
pub use pricing::{PriceClient, PriceError};
