//! Pitaka view: navigation pages for every grouping above the chapters.
//!
//! A node is emitted when it has at least one branch child; its subtree is
//! then walked for further such nodes. A node without branch children ends
//! the walk for its subtree. Path and breadcrumb are both the full ancestry.
//! Translation lists are replaced with a single marker throughout.

use super::dedup::PathGuard;
use super::{FlatEntry, Redaction, join_path, node_fields};
use crate::types::ContentNode;

pub fn pitaka(tree: &[ContentNode]) -> Vec<FlatEntry> {
    let mut guard = PathGuard::new();
    let mut entries = Vec::new();
    collect(tree, "", &mut guard, &mut entries);
    entries
}

fn collect(nodes: &[ContentNode], parent: &str, guard: &mut PathGuard, out: &mut Vec<FlatEntry>) {
    for node in nodes {
        if !node.has_branch_child() {
            continue;
        }
        let path = join_path(parent, &node.uid);
        if guard.admit(&path) {
            out.push(FlatEntry::new(
                node.uid.as_str(),
                path.as_str(),
                path.as_str(),
                node_fields(node, Redaction::Translations),
            ));
        }
        collect(&node.children, &path, guard, out);
    }
}
