//! Cache module for storing the pricing catalog and resolved prices on disk
//!
//! This module provides a cache manager that persists raw byte blobs to the
//! filesystem and judges their freshness by file modification time, plus the
//! key derivation used to name per-query result files.

mod key;
mod manager;

pub use key::{CacheKey, CATALOG_KEY};
pub use manager::{CacheManager, StoreError};
