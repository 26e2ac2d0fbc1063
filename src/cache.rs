//! On-disk response cache for upstream API calls.
//!
//! A full catalog build issues tens of thousands of requests. This module
//! lets repeat builds skip the network for any URL fetched within the
//! configured lifetime.
//!
//! # Design
//!
//! ## Cache keys
//!
//! Entries are addressed by the SHA-256 of the request URL. Each entry is
//! two files in the cache directory:
//!
//! - `<key>.json`: the response body exactly as decoded.
//! - `<key>.meta.json`: the URL, the original retrieval time and a format
//!   version.
//!
//! The sidecar carries the timestamp so a cache hit reports when the data
//! was *originally* retrieved, not when it was read back.
//!
//! ## Degraded sidecars
//!
//! A body without a readable sidecar is still served while the body file's
//! modification time is within the lifetime; its retrieval time is unknown
//! and the caller substitutes the current time. If the file age cannot be
//! read either, only a `Forever` cache serves it. A sidecar whose URL or
//! version does not match is a miss.
//!
//! The sidecar is written before the body, so an interrupted store leaves a
//! sidecar without a body (a miss) rather than an undated body.
//!
//! ## Failures
//!
//! Reads never fail: anything unreadable or corrupt is a miss. Write
//! failures are returned to the caller, which logs and carries on with the
//! freshly fetched value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bump to invalidate every existing entry when the format changes.
const CACHE_VERSION: u32 = 1;

const BODY_SUFFIX: &str = ".json";
const META_SUFFIX: &str = ".meta.json";

/// How long a cached response stays usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLifetime {
    Forever,
    For(Duration),
}

impl CacheLifetime {
    /// Whether data retrieved at `fetched_at` is still usable at `now`.
    pub fn is_fresh(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            CacheLifetime::Forever => true,
            CacheLifetime::For(limit) => match (now - fetched_at).to_std() {
                Ok(age) => age < *limit,
                // Retrieved "in the future": clock skew, treat as fresh.
                Err(_) => true,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheMeta {
    version: u32,
    url: String,
    fetched_at: DateTime<Utc>,
}

/// A response read back from the cache.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub value: Value,
    /// Original retrieval time; `None` when the sidecar was unreadable.
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    lifetime: CacheLifetime,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>, lifetime: CacheLifetime) -> Self {
        Self {
            dir: dir.into(),
            lifetime,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn lifetime(&self) -> CacheLifetime {
        self.lifetime
    }

    /// Look up a URL. Returns `None` on a miss or an expired entry.
    pub async fn lookup(&self, url: &str) -> Option<CachedResponse> {
        let key = cache_key(url);
        let body_path = self.body_path(&key);
        let body = tokio::fs::read(&body_path).await.ok()?;
        let value: Value = serde_json::from_slice(&body).ok()?;

        let meta = match tokio::fs::read(self.meta_path(&key)).await {
            Ok(bytes) => serde_json::from_slice::<CacheMeta>(&bytes).ok(),
            Err(_) => None,
        };
        let Some(meta) = meta else {
            if !self.undated_body_is_fresh(&body_path).await {
                return None;
            }
            return Some(CachedResponse {
                value,
                fetched_at: None,
            });
        };
        if meta.version != CACHE_VERSION || meta.url != url {
            return None;
        }
        if !self.lifetime.is_fresh(meta.fetched_at, Utc::now()) {
            return None;
        }
        Some(CachedResponse {
            value,
            fetched_at: Some(meta.fetched_at),
        })
    }

    /// Persist a response and its retrieval time.
    pub async fn store(&self, url: &str, value: &Value, fetched_at: DateTime<Utc>) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let key = cache_key(url);
        let meta = CacheMeta {
            version: CACHE_VERSION,
            url: url.to_string(),
            fetched_at,
        };
        tokio::fs::write(self.meta_path(&key), serde_json::to_vec(&meta)?).await?;
        tokio::fs::write(self.body_path(&key), serde_json::to_vec(value)?).await
    }

    /// Freshness of a body whose sidecar is gone, judged by file age.
    async fn undated_body_is_fresh(&self, body_path: &Path) -> bool {
        if self.lifetime == CacheLifetime::Forever {
            return true;
        }
        match tokio::fs::metadata(body_path).await.and_then(|m| m.modified()) {
            Ok(modified) => self.lifetime.is_fresh(DateTime::<Utc>::from(modified), Utc::now()),
            Err(_) => false,
        }
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}{BODY_SUFFIX}"))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}{META_SUFFIX}"))
    }
}

/// SHA-256 of the URL, returned as a hex string.
pub fn cache_key(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}
