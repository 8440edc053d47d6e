//! Content-addressed response cache.
//!
//! Entries are keyed by [`PageId::cache_key`](crate::PageId::cache_key), the
//! SHA-256 of the normalized request URL, and hold the raw response bytes.
//! The pipeline never deletes entries on its own; [`CachePolicy::max_age`]
//! and [`PageCache::invalidate`] are the only ways an entry stops being served.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::{RedditEpubError, Result};

/// Storage for fetched page bodies.
pub trait PageCache {
    /// Returns the stored body for `key`, or `None` on a miss.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `body` under `key`, replacing any previous entry.
    fn put(&self, key: &str, body: &[u8]) -> Result<()>;

    /// Removes the entry for `key`. Missing entries are not an error.
    fn invalidate(&self, key: &str) -> Result<()>;
}

impl<T: PageCache + ?Sized> PageCache for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        (**self).put(key, body)
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        (**self).invalidate(key)
    }
}

/// Freshness rules for disk entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct CachePolicy {
    /// Entries older than this are treated as misses. `None` never expires.
    pub max_age: Option<Duration>,
}

/// Cache stored as one file per entry: `<dir>/<prefix><key>.json`.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    prefix: String,
    policy: CachePolicy,
}

impl DiskCache {
    /// Creates a cache rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self { dir: dir.into(), prefix: prefix.into(), policy: CachePolicy::default() }
    }

    /// Creates a cache in the system temporary directory.
    pub fn in_temp_dir(prefix: impl Into<String>) -> Self {
        Self::new(std::env::temp_dir(), prefix)
    }

    /// Replaces the freshness policy.
    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}.json", self.prefix, key))
    }

    fn is_stale(&self, path: &Path) -> Result<bool> {
        let Some(max_age) = self.policy.max_age else {
            return Ok(false);
        };
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|source| RedditEpubError::Cache { path: path.to_path_buf(), source })?;
        let age = SystemTime::now().duration_since(modified).unwrap_or_default();
        Ok(age > max_age)
    }
}

impl PageCache for DiskCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        match fs::read(&path) {
            Ok(body) => {
                if self.is_stale(&path)? {
                    debug!(path = %path.display(), "cache entry expired");
                    return Ok(None);
                }
                Ok(Some(body))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(RedditEpubError::Cache { path, source }),
        }
    }

    fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        let path = self.entry_path(key);
        let tmp = self.dir.join(format!("{}{}.json.{}.tmp", self.prefix, key, std::process::id()));
        let cache_err = |source: std::io::Error| RedditEpubError::Cache { path: path.clone(), source };

        fs::create_dir_all(&self.dir).map_err(cache_err)?;
        fs::write(&tmp, body).map_err(cache_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600)).map_err(cache_err)?;
        }

        fs::rename(&tmp, &path).map_err(cache_err)
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(RedditEpubError::Cache { path, source }),
        }
    }
}

/// Process-local cache, used for `--no-cache` runs and tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PageCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned())
    }

    fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), body.to_vec());
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_disk_cache_round_trip() {
        let tmp = TempDir::new().unwrap();
        let cache = DiskCache::new(tmp.path(), "redditepub-");

        assert_eq!(cache.get("abc").unwrap(), None);
        cache.put("abc", b"[1,2]").unwrap();
        assert_eq!(cache.get("abc").unwrap(), Some(b"[1,2]".to_vec()));
        assert!(tmp.path().join("redditepub-abc.json").exists());
    }

    #[test]
    fn test_disk_cache_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let cache = DiskCache::new(tmp.path(), "redditepub-");
        cache.put("abc", b"{}").unwrap();

        let names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["redditepub-abc.json".to_string()]);
    }

    #[test]
    fn test_disk_cache_invalidate() {
        let tmp = TempDir::new().unwrap();
        let cache = DiskCache::new(tmp.path(), "redditepub-");
        cache.put("abc", b"{}").unwrap();
        cache.invalidate("abc").unwrap();
        cache.invalidate("abc").unwrap();
        assert_eq!(cache.get("abc").unwrap(), None);
    }

    #[test]
    fn test_disk_cache_max_age_zero_expires() {
        let tmp = TempDir::new().unwrap();
        let cache = DiskCache::new(tmp.path(), "redditepub-")
            .with_policy(CachePolicy { max_age: Some(Duration::ZERO) });
        cache.put("abc", b"{}").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("abc").unwrap(), None);
    }

    #[test]
    fn test_disk_cache_generous_max_age_hits() {
        let tmp = TempDir::new().unwrap();
        let cache = DiskCache::new(tmp.path(), "redditepub-")
            .with_policy(CachePolicy { max_age: Some(Duration::from_secs(3600)) });
        cache.put("abc", b"{}").unwrap();
        assert_eq!(cache.get("abc").unwrap(), Some(b"{}".to_vec()));
    }

    #[test]
    fn test_memory_cache() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty());
        cache.put("k", b"v").unwrap();
        assert_eq!(cache.get("k").unwrap(), Some(b"v".to_vec()));
        cache.invalidate("k").unwrap();
        assert!(cache.is_empty());
    }
}
