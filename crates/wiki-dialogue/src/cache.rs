//! On-disk response cache.
//!
//! Each successful GET response is stored as a small JSON file named by the
//! 64-bit FNV-1a hash of its URL, sharded into subdirectories by the first
//! two hex digits:
//!
//! ```text
//! .cache/
//!   3f/
//!     3f9a0c21d4e7b810
//! ```
//!
//! The stored URL is compared on read, so a hash collision is a miss rather
//! than a wrong page.

use std::fs;
use std::hash::Hasher;
use std::path::PathBuf;

use fnv::FnvHasher;
use serde::{Deserialize, Serialize};

use crate::types::CrawlResult;

/// A cached response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Response cache backed by the filesystem.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    cache_dir: PathBuf,
}

impl ResponseCache {
    /// Create a cache rooted at `cache_dir`. The directory is created lazily.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Cache key for a URL: 16 lower-case hex digits.
    pub fn key(url: &str) -> String {
        let mut hasher = FnvHasher::default();
        hasher.write(url.as_bytes());
        format!("{:016x}", hasher.finish())
    }

    fn path_for(&self, url: &str) -> PathBuf {
        let key = Self::key(url);
        self.cache_dir.join(&key[..2]).join(key)
    }

    /// Look up a URL. Unreadable or mismatched entries count as misses.
    pub fn get(&self, url: &str) -> Option<CachedPage> {
        let path = self.path_for(url);
        let data = fs::read(&path).ok()?;
        match serde_json::from_slice::<CachedPage>(&data) {
            Ok(page) if page.url == url => Some(page),
            Ok(_) => {
                tracing::debug!("cache key collision for {url}");
                None
            }
            Err(e) => {
                tracing::debug!("ignoring corrupt cache entry {}: {e}", path.display());
                None
            }
        }
    }

    /// Store a response, replacing any previous entry for the URL.
    pub fn put(&self, page: &CachedPage) -> CrawlResult<PathBuf> {
        let path = self.path_for(&page.url);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec(page)?;
        fs::write(&path, data)?;
        Ok(path)
    }

    /// Number of cached responses on disk.
    pub fn count(&self) -> usize {
        let Ok(shards) = fs::read_dir(&self.cache_dir) else {
            return 0;
        };
        shards
            .flatten()
            .filter(|e| e.path().is_dir())
            .filter_map(|e| fs::read_dir(e.path()).ok())
            .map(|entries| entries.flatten().count())
            .sum()
    }
}
