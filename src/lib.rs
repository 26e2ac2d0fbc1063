//! # scx-catalog
//!
//! Aggregates the SuttaCentral catalog into a single in-memory tree and
//! flattens that tree into page-oriented views for a static site generator.
//! The upstream REST API is the data source: menus give the hierarchy,
//! suttaplex records describe each text, and every kept translation brings
//! its text body and publication details.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Build    API roots  →  Vec<ContentNode>   (network → unified tree)
//! 2. Flatten  tree       →  Vec<FlatEntry>     (one list per page view)
//! ```
//!
//! The tree is built at most once per process and shared by every view.
//! Views are pure functions of the tree, so each one can be tested without
//! touching the network.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Single-flight owner of the built tree; computes views |
//! | [`tree`] | Stage 1: recursive menu walk, leaf detail, translation filter |
//! | [`views`] | Stage 2: index, pitaka, chapter, text-meta and text flatteners |
//! | [`fetch`] | `JsonSource` trait, reqwest source, cache-aware `Fetcher`, stats |
//! | [`cache`] | SHA-256 keyed on-disk response cache with retrieval timestamps |
//! | [`limiter`] | Wave-based concurrency cap for fan-out fetches |
//! | [`endpoints`] | Upstream URL construction |
//! | [`config`] | `scx.toml` loading, validation, merging over stock defaults |
//! | [`types`] | The unified tree: `ContentNode`, `TranslationRecord`, `ParallelsMap` |
//! | [`naming`] | Unit identifier grammar: compound ranges, acronyms, titles |
//! | [`output`] | CLI output formatting for the tree and build summaries |
//!
//! # Design Decisions
//!
//! ## Partial Results Over Failure
//!
//! A full build issues tens of thousands of requests against a public API.
//! Any single request may fail, so no failure is fatal: a missing menu
//! prunes one subtree, a missing suttaplex leaves a bare leaf, a missing text
//! body drops one translation. Every failure is logged and counted, and the
//! build summary reports the totals.
//!
//! ## Waves, Not Spawned Tasks
//!
//! Fan-out (children of a branch, translations of a leaf) runs in waves of
//! at most `max_concurrent` futures joined together. Nothing is spawned, so
//! every future borrows the builder directly and the tree comes back in
//! upstream order without re-sorting.
//!
//! ## Retrieval Time Survives the Cache
//!
//! Each node records when its data was originally fetched. The response
//! cache stores that time beside the body, so a warm rebuild reports the
//! same timestamps as the cold build that populated it.
//!
//! ## Detail-Bearing Branches Are Named, Not Guessed
//!
//! Pātimokkha collections are branches that also have their own suttaplex
//! record. Which branches qualify is a configurable naming rule, and the
//! matching role is recorded on the node so views never re-derive it from
//! the uid.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod endpoints;
pub mod fetch;
pub mod limiter;
pub mod naming;
pub mod output;
pub mod tree;
pub mod types;
pub mod views;

#[cfg(test)]
pub(crate) mod test_helpers;
