//! Chapter views: one listing page per lowest-level grouping.
//!
//! Two stopping rules are offered. [`chapters`] stops at the deepest branches
//! (no branch children) and at detail-bearing collections; this is the view
//! the site paginates by. [`chapters_by_leaf_parent`] stops at any node that
//! directly contains a text, which groups mixed branches differently.
//!
//! Entries are addressed by uid alone and deduplicated on it.

use super::dedup::PathGuard;
use super::{FlatEntry, Redaction, StopRule, node_fields, walk};
use crate::types::ContentNode;

pub fn chapters(tree: &[ContentNode]) -> Vec<FlatEntry> {
    collect(tree, StopRule::NoBranchChildren)
}

pub fn chapters_by_leaf_parent(tree: &[ContentNode]) -> Vec<FlatEntry> {
    collect(tree, StopRule::LeafChildren)
}

fn collect(tree: &[ContentNode], rule: StopRule) -> Vec<FlatEntry> {
    let mut guard = PathGuard::new();
    let mut entries = Vec::new();
    walk(tree, rule, "", &mut |node, ancestry| {
        if guard.admit(&node.uid) {
            entries.push(FlatEntry::new(
                node.uid.as_str(),
                node.uid.as_str(),
                ancestry,
                node_fields(node, Redaction::Bodies),
            ));
        }
    });
    entries
}
