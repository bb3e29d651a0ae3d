//! Cache key derivation for price queries

use std::fmt;

use sha2::{Digest, Sha256};

use crate::data::Query;

/// Cache key for the raw catalog
///
/// This key does not depend on the catalog URL: pointing at another URL keeps
/// serving the cached catalog until it goes stale.
pub const CATALOG_KEY: &str = "offers";

/// Prefix mixed into every query digest
const QUERY_KEY_DOMAIN: &[u8] = b"ec2-price/query/v1";

/// Hex-encoded SHA-256 digest identifying one price query
///
/// Each field is length-prefixed before hashing, so distinct queries whose
/// plain concatenations coincide still get distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for a query
    pub fn for_query(query: &Query) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(QUERY_KEY_DOMAIN);
        for field in query.fields() {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_query() -> Query {
        Query::new("m4.4xlarge", "Shared", "Linux", "OnDemand")
    }

    #[test]
    fn test_key_is_deterministic() {
        assert_eq!(
            CacheKey::for_query(&default_query()),
            CacheKey::for_query(&default_query())
        );
    }

    #[test]
    fn test_key_is_64_hex_chars() {
        let key = CacheKey::for_query(&default_query());
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key.to_string(), key.as_str());
    }

    #[test]
    fn test_key_differs_per_field() {
        let base = CacheKey::for_query(&default_query());
        let variants = [
            Query::new("m4.2xlarge", "Shared", "Linux", "OnDemand"),
            Query::new("m4.4xlarge", "Dedicated", "Linux", "OnDemand"),
            Query::new("m4.4xlarge", "Shared", "Windows", "OnDemand"),
            Query::new("m4.4xlarge", "Shared", "Linux", "Reserved"),
        ];

        for variant in &variants {
            assert_ne!(base, CacheKey::for_query(variant), "Collision for {}", variant);
        }
    }

    #[test]
    fn test_key_no_collision_when_concatenations_coincide() {
        let a = Query::new("m4.4xlarge", "Shared", "Linux", "OnDemand");
        let b = Query::new("m4.4xlargeS", "hared", "Linux", "OnDemand");
        let c = Query::new("m4.4xlarge", "SharedLinux", "", "OnDemand");

        assert_ne!(CacheKey::for_query(&a), CacheKey::for_query(&b));
        assert_ne!(CacheKey::for_query(&a), CacheKey::for_query(&c));
        assert_ne!(CacheKey::for_query(&b), CacheKey::for_query(&c));
    }

    #[test]
    fn test_key_never_equals_catalog_key() {
        assert_ne!(CacheKey::for_query(&default_query()).as_str(), CATALOG_KEY);
    }
}
