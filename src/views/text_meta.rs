//! Text metadata view: one entry per leaf, for the suttaplex card pages.

use super::dedup::PathGuard;
use super::{FlatEntry, Redaction, StopRule, node_fields, walk};
use crate::types::ContentNode;

pub fn text_meta(tree: &[ContentNode]) -> Vec<FlatEntry> {
    let mut guard = PathGuard::new();
    let mut entries = Vec::new();
    walk(tree, StopRule::Leaf, "", &mut |node, ancestry| {
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
