//! Cache manager for persisting blobs to disk
//!
//! Provides a `CacheManager` that stores raw bytes under string keys, one file
//! per key. Freshness is decided from the file's modification time, so nothing
//! about expiry is stored inside the blob itself.

use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Size of a cached price blob (little-endian IEEE-754 double)
const PRICE_BLOB_LEN: usize = 8;

/// Errors that can occur when reading or writing the cache
#[derive(Debug, Error)]
pub enum StoreError {
    /// No blob is stored under the key
    #[error("No cache entry for key '{0}'")]
    NotFound(String),

    /// Disk read/write failure
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Manages reading and writing cached blobs to disk
///
/// Each key maps to a file directly under the cache directory. Writes go
/// through a temporary file in the same directory and are renamed into place,
/// so a concurrent reader sees either the old blob or the new one.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager rooted at the given directory
    ///
    /// The directory is created lazily on first write.
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Returns the path to the cache file for the given key
    pub fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(key)
    }

    /// Ensures the cache directory exists
    pub fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| StoreError::io(&self.cache_dir, e))
    }

    /// Returns when the blob under `key` was last written, if it exists
    pub fn modified_at(&self, key: &str) -> Option<DateTime<Utc>> {
        let modified = fs::metadata(self.cache_path(key)).ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }

    /// Checks whether a blob exists under `key` and is younger than `max_age`
    ///
    /// A modification time in the future counts as fresh. Any error while
    /// inspecting the file counts as "not fresh".
    pub fn has_fresh(&self, key: &str, max_age: Duration) -> bool {
        let Ok(metadata) = fs::metadata(self.cache_path(key)) else {
            return false;
        };
        if !metadata.is_file() {
            return false;
        }
        let Ok(modified) = metadata.modified() else {
            return false;
        };

        match SystemTime::now().duration_since(modified) {
            Ok(age) => age < max_age,
            Err(_) => true,
        }
    }

    /// Reads the blob stored under `key`
    ///
    /// # Returns
    /// * `Ok(bytes)` if the entry exists
    /// * `Err(StoreError::NotFound)` if there is no entry for the key
    /// * `Err(StoreError::Io)` for any other read failure
    pub fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.cache_path(key);
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(key.to_string()),
            _ => StoreError::io(&path, e),
        })
    }

    /// Writes `bytes` under `key`, replacing any existing blob
    ///
    /// Creates the cache directory if it is missing.
    pub fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.ensure_dir()?;

        let path = self.cache_path(key);
        let mut tmp =
            NamedTempFile::new_in(&self.cache_dir).map_err(|e| StoreError::io(&self.cache_dir, e))?;
        tmp.write_all(bytes).map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;

        Ok(())
    }

    /// Reads a price blob written by [`CacheManager::write_f64`]
    ///
    /// Returns `Ok(None)` if the blob is not exactly 8 bytes long.
    pub fn read_f64(&self, key: &str) -> Result<Option<f64>, StoreError> {
        let bytes = self.read(key)?;
        Ok(decode_f64(&bytes))
    }

    /// Writes a price as an 8-byte little-endian double
    pub fn write_f64(&self, key: &str, value: f64) -> Result<(), StoreError> {
        self.write(key, &value.to_le_bytes())
    }
}

fn decode_f64(bytes: &[u8]) -> Option<f64> {
    let raw: [u8; PRICE_BLOB_LEN] = bytes.try_into().ok()?;
    Some(f64::from_le_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn create_test_cache() -> (CacheManager, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = CacheManager::with_dir(temp_dir.path().to_path_buf());
        (cache, temp_dir)
    }

    /// Moves the modification time of a cache file into the past
    fn backdate(path: &Path, secs: u64) {
        let file = File::options()
            .write(true)
            .open(path)
            .expect("Should open cache file");
        file.set_modified(SystemTime::now() - Duration::from_secs(secs))
            .expect("Should set mtime");
    }

    #[test]
    fn test_write_creates_file_in_cache_directory() {
        let (cache, temp_dir) = create_test_cache();

        cache.write("offers", b"{}").expect("Write should succeed");

        let expected_path = temp_dir.path().join("offers");
        assert!(expected_path.exists(), "Cache file should exist");
        assert_eq!(fs::read(&expected_path).unwrap(), b"{}");
    }

    #[test]
    fn test_read_returns_not_found_for_missing_key() {
        let (cache, _temp_dir) = create_test_cache();

        let result = cache.read("nonexistent_key");

        assert!(
            matches!(result, Err(StoreError::NotFound(ref key)) if key == "nonexistent_key"),
            "Should return NotFound for missing key, got {:?}",
            result
        );
    }

    #[test]
    fn test_write_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache").join("dir");
        let cache = CacheManager::with_dir(nested_path.clone());

        cache.write("nested_key", b"data").expect("Write should succeed");

        assert!(nested_path.exists(), "Nested directory should be created");
        assert!(nested_path.join("nested_key").exists(), "Cache file should exist");
    }

    #[test]
    fn test_overwrite_existing_cache() {
        let (cache, _temp_dir) = create_test_cache();

        cache.write("overwrite_key", b"first").expect("First write should succeed");
        cache.write("overwrite_key", b"second").expect("Second write should succeed");

        let data = cache.read("overwrite_key").expect("Should read cache");
        assert_eq!(data, b"second", "Cache should contain latest data");
    }

    #[test]
    fn test_write_leaves_no_temporary_files() {
        let (cache, temp_dir) = create_test_cache();

        cache.write("key", b"value").expect("Write should succeed");
        cache.write("key", b"value2").expect("Write should succeed");

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("key")]);
    }

    #[test]
    fn test_has_fresh_false_for_missing_key() {
        let (cache, _temp_dir) = create_test_cache();
        assert!(!cache.has_fresh("missing", Duration::from_secs(86_400)));
    }

    #[test]
    fn test_has_fresh_true_after_write() {
        let (cache, _temp_dir) = create_test_cache();
        cache.write("fresh_key", b"data").unwrap();
        assert!(cache.has_fresh("fresh_key", Duration::from_secs(86_400)));
    }

    #[test]
    fn test_has_fresh_false_once_max_age_elapsed() {
        let (cache, _temp_dir) = create_test_cache();
        cache.write("old_key", b"data").unwrap();

        backdate(&cache.cache_path("old_key"), 86_401);

        assert!(!cache.has_fresh("old_key", Duration::from_secs(86_400)));
        // Stale blobs remain readable
        assert_eq!(cache.read("old_key").unwrap(), b"data");
    }

    #[test]
    fn test_has_fresh_false_with_zero_max_age() {
        let (cache, _temp_dir) = create_test_cache();
        cache.write("key", b"data").unwrap();
        assert!(!cache.has_fresh("key", Duration::ZERO));
    }

    #[test]
    fn test_has_fresh_true_for_future_mtime() {
        let (cache, _temp_dir) = create_test_cache();
        cache.write("key", b"data").unwrap();

        let file = File::options()
            .write(true)
            .open(cache.cache_path("key"))
            .unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(3600))
            .unwrap();

        assert!(cache.has_fresh("key", Duration::from_secs(60)));
    }

    #[test]
    fn test_has_fresh_false_for_directory() {
        let (cache, temp_dir) = create_test_cache();
        fs::create_dir(temp_dir.path().join("subdir")).unwrap();
        assert!(!cache.has_fresh("subdir", Duration::from_secs(86_400)));
    }

    #[test]
    fn test_f64_roundtrip_is_bit_identical() {
        let (cache, _temp_dir) = create_test_cache();

        for value in [0.956, 0.1 + 0.2, f64::MIN_POSITIVE, 1e300, -0.0, 12345.678901234] {
            cache.write_f64("price", value).unwrap();
            let read = cache.read_f64("price").unwrap().expect("8-byte blob");
            assert_eq!(read.to_bits(), value.to_bits(), "Roundtrip changed {}", value);
        }
    }

    #[test]
    fn test_f64_blob_is_eight_little_endian_bytes() {
        let (cache, temp_dir) = create_test_cache();

        cache.write_f64("price", 0.956).unwrap();

        let raw = fs::read(temp_dir.path().join("price")).unwrap();
        assert_eq!(raw.len(), 8);
        assert_eq!(raw, 0.956f64.to_le_bytes());
    }

    #[test]
    fn test_read_f64_rejects_wrong_length() {
        let (cache, _temp_dir) = create_test_cache();

        cache.write("short", &[1, 2, 3]).unwrap();

        assert_eq!(cache.read_f64("short").unwrap(), None);
    }

    #[test]
    fn test_modified_at_recorded() {
        let (cache, _temp_dir) = create_test_cache();
        assert!(cache.modified_at("key").is_none());

        let before = Utc::now() - chrono::Duration::seconds(5);
        cache.write("key", b"data").unwrap();
        let after = Utc::now() + chrono::Duration::seconds(5);

        let modified = cache.modified_at("key").expect("Should have mtime");
        assert!(modified >= before && modified <= after);
    }
}
