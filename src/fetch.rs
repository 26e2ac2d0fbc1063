//! Fetching JSON from the upstream API.
//!
//! [`JsonSource`] is the seam between the tree builder and the network:
//! [`HttpSource`] talks to the real API through reqwest, tests substitute a
//! recording mock. [`Fetcher`] layers the on-disk [`ResponseCache`] and
//! build-wide statistics on top of any source.
//!
//! Every failure (transport, non-success status, undecodable body) becomes a
//! [`FetchError`]. Callers decide whether a failure prunes a node, drops a
//! translation, or is simply recorded as absent.

use crate::cache::ResponseCache;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// Something that can turn a URL into decoded JSON.
pub trait JsonSource: Send + Sync {
    fn get_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FetchError>>;
}

impl<T: JsonSource + ?Sized> JsonSource for Arc<T> {
    fn get_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FetchError>> {
        (**self).get_json(url)
    }
}

/// Real HTTP source using reqwest.
///
/// No request timeout is set: large collections legitimately take minutes
/// and a stalled request stalls only its own wave.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("scx-catalog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl JsonSource for HttpSource {
    fn get_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FetchError>> {
        Box::pin(async move {
            let transport = |e: reqwest::Error| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            };
            let response = self.client.get(url).send().await.map_err(transport)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let bytes = response.bytes().await.map_err(transport)?;
            serde_json::from_slice(&bytes).map_err(|source| FetchError::Json {
                url: url.to_string(),
                source,
            })
        })
    }
}

/// A decoded response and when it was originally retrieved.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub value: Value,
    pub fetched_at: DateTime<Utc>,
}

/// Build-wide request counters. Shared by every concurrent fetch.
#[derive(Debug, Default)]
pub struct FetchStats {
    requests: AtomicU64,
    cache_hits: AtomicU64,
    failures: AtomicU64,
    publication_info_misses: AtomicU64,
    publication_info_failures: AtomicU64,
    cache_timestamp_errors: AtomicU64,
    cache_write_errors: AtomicU64,
}

impl FetchStats {
    /// Publication info answered with an error object.
    pub fn record_publication_info_miss(&self) {
        self.publication_info_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Publication info request failed; also a miss.
    pub fn record_publication_info_failure(&self) {
        self.publication_info_misses.fetch_add(1, Ordering::Relaxed);
        self.publication_info_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> FetchSummary {
        FetchSummary {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            publication_info_misses: self.publication_info_misses.load(Ordering::Relaxed),
            publication_info_failures: self.publication_info_failures.load(Ordering::Relaxed),
            cache_timestamp_errors: self.cache_timestamp_errors.load(Ordering::Relaxed),
            cache_write_errors: self.cache_write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`FetchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub requests: u64,
    pub cache_hits: u64,
    pub failures: u64,
    /// Translations with no publication info (failed or error response).
    pub publication_info_misses: u64,
    /// Failed publication info requests, a subset of `failures`.
    pub publication_info_failures: u64,
    /// Cache hits whose retrieval time could not be read.
    pub cache_timestamp_errors: u64,
    pub cache_write_errors: u64,
}

impl FetchSummary {
    pub fn successes(&self) -> u64 {
        self.requests.saturating_sub(self.failures)
    }

    /// Percentage of requests that succeeded; 100 when nothing was requested.
    pub fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            return 100.0;
        }
        self.successes() as f64 / self.requests as f64 * 100.0
    }
}

impl fmt::Display for FetchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} requests succeeded ({:.1}%), {} from cache",
            self.successes(),
            self.requests,
            self.success_rate(),
            self.cache_hits
        )?;
        if self.failures > 0 {
            write!(f, ", {} failed", self.failures)?;
        }
        Ok(())
    }
}

/// Cache-aware, counting wrapper around a [`JsonSource`].
pub struct Fetcher<S> {
    source: S,
    cache: Option<ResponseCache>,
    stats: FetchStats,
}

impl<S: JsonSource> Fetcher<S> {
    pub fn new(source: S, cache: Option<ResponseCache>) -> Self {
        Self {
            source,
            cache,
            stats: FetchStats::default(),
        }
    }

    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }

    /// Retrieve a URL, preferring a fresh cache entry over the network.
    pub async fn fetch_json(&self, url: &str) -> Result<Fetched, FetchError> {
        self.stats.requests.fetch_add(1, Ordering::Relaxed);

        if let Some(cache) = &self.cache
            && let Some(hit) = cache.lookup(url).await
        {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            let fetched_at = match hit.fetched_at {
                Some(at) => at,
                None => {
                    self.stats.cache_timestamp_errors.fetch_add(1, Ordering::Relaxed);
                    warn!(%url, "cache timestamp unreadable, using current time");
                    Utc::now()
                }
            };
            return Ok(Fetched {
                value: hit.value,
                fetched_at,
            });
        }

        let value = match self.source.get_json(url).await {
            Ok(value) => value,
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };
        let fetched_at = Utc::now();
        debug!(%url, "fetched");

        if let Some(cache) = &self.cache
            && let Err(e) = cache.store(url, &value, fetched_at).await
        {
            self.stats.cache_write_errors.fetch_add(1, Ordering::Relaxed);
            warn!(%url, error = %e, "failed to write cache entry");
        }

        Ok(Fetched { value, fetched_at })
    }
}
