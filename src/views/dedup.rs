//! Path uniqueness within one view.
//!
//! Upstream data occasionally lists the same translation twice for a text,
//! and shared subtrees can surface the same uid under two parents. The first
//! occurrence wins; later ones are dropped.
//!
//! A guard is created fresh for every flatten call, so recomputing a view
//! never sees paths from an earlier run.

use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Default)]
pub struct PathGuard {
    seen: HashSet<String>,
}

impl PathGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `path`. Returns `false` if it was already claimed.
    pub fn admit(&mut self, path: &str) -> bool {
        if self.seen.contains(path) {
            debug!(%path, "duplicate path dropped");
            return false;
        }
        self.seen.insert(path.to_string());
        true
    }
}
