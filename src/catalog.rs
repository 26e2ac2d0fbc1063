//! The catalog: a lazily built, shared unified tree.
//!
//! The first caller of [`Catalog::tree`] triggers the build; concurrent
//! callers wait on that same build and every later caller receives the
//! stored result. There is no invalidation: a process builds its catalog at
//! most once. All views are computed from the shared tree.
//!
//! Roots are built concurrently. A root whose menu cannot be fetched is
//! absent from the result; an entirely unreachable upstream yields an empty
//! tree, which is a valid (if useless) catalog.

use crate::cache::ResponseCache;
use crate::config::{CatalogConfig, ConfigError};
use crate::endpoints::Endpoints;
use crate::fetch::{FetchError, FetchSummary, Fetcher, HttpSource, JsonSource};
use crate::tree::{TreeBuilder, TreeOptions};
use crate::types::ContentNode;
use crate::views::{FlatEntry, ViewKind};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub struct Catalog<S> {
    builder: TreeBuilder<S>,
    roots: Vec<String>,
    tree: OnceCell<Arc<Vec<ContentNode>>>,
    elapsed: OnceCell<Duration>,
}

impl Catalog<HttpSource> {
    /// Catalog against the real API, with the response cache the config
    /// selects for its environment.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let cache = config
            .cache_lifetime()?
            .map(|lifetime| ResponseCache::new(&config.cache.dir, lifetime));
        let fetcher = Fetcher::new(HttpSource::new()?, cache);
        let builder = TreeBuilder::new(
            fetcher,
            Endpoints::from_config(&config.api),
            TreeOptions::from_config(config),
        );
        Ok(Self::new(builder, config.roots.clone()))
    }
}

impl<S: JsonSource> Catalog<S> {
    pub fn new(builder: TreeBuilder<S>, roots: Vec<String>) -> Self {
        Self {
            builder,
            roots,
            tree: OnceCell::new(),
            elapsed: OnceCell::new(),
        }
    }

    /// The unified tree, building it on first use.
    pub async fn tree(&self) -> Arc<Vec<ContentNode>> {
        Arc::clone(self.tree.get_or_init(|| self.build()).await)
    }

    /// Compute one flattened view of the tree.
    pub async fn view(&self, kind: ViewKind) -> Vec<FlatEntry> {
        kind.flatten(&self.tree().await)
    }

    pub fn stats(&self) -> FetchSummary {
        self.builder.fetcher().stats().summary()
    }

    /// Build duration, once the tree exists.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed.get().copied()
    }

    async fn build(&self) -> Arc<Vec<ContentNode>> {
        let started = Instant::now();
        info!(roots = ?self.roots, "building catalog tree");

        let built = join_all(
            self.roots
                .iter()
                .map(|uid| self.builder.build_node(uid.clone(), 0)),
        )
        .await;
        let tree: Vec<ContentNode> = built.into_iter().flatten().collect();

        let elapsed = started.elapsed();
        let _ = self.elapsed.set(elapsed);
        let summary = self.stats();
        info!(
            roots = tree.len(),
            requests = summary.requests,
            cache_hits = summary.cache_hits,
            failures = summary.failures,
            publication_info_misses = summary.publication_info_misses,
            publication_info_failures = summary.publication_info_failures,
            cache_timestamp_errors = summary.cache_timestamp_errors,
            elapsed_secs = elapsed.as_secs_f64(),
            "catalog tree built"
        );
        if tree.is_empty() {
            warn!("no roots could be fetched, catalog is empty");
        }

        Arc::new(tree)
    }
}
