//! Index view: the top-level collections for the home page.
//!
//! Each entry keeps its children (the first navigation level) and replaces
//! everything below them with a marker.

use super::dedup::PathGuard;
use super::{FlatEntry, Redaction, node_fields};
use crate::types::ContentNode;

pub fn index(tree: &[ContentNode]) -> Vec<FlatEntry> {
    let mut guard = PathGuard::new();
    tree.iter()
        .filter(|node| guard.admit(&node.uid))
        .map(|node| {
            FlatEntry::new(
                node.uid.as_str(),
                node.uid.as_str(),
                node.uid.as_str(),
                node_fields(node, Redaction::GrandChildren),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use serde_json::json;

    #[test]
    fn one_entry_per_root() {
        let tree = vec![
            root("sutta", vec![branch("mn", vec![leaf("mn1", vec![])])]),
            root("vinaya", vec![]),
        ];

        let entries = index(&tree);

        assert_eq!(entry_paths(&entries), vec!["sutta", "vinaya"]);
        assert_eq!(entries[0].breadcrumb, "sutta");
        assert_eq!(entries[0].str_field("node_type"), Some("root"));
    }

    #[test]
    fn keeps_children_and_redacts_grandchildren() {
        let tree = vec![root("sutta", vec![branch("mn", vec![leaf("mn1", vec![])])])];

        let entry = &index(&tree)[0];
        let mn = &entry.field("children").unwrap()[0];

        assert_eq!(mn["uid"], "mn");
        assert_eq!(mn["children"], json!([{"redacted": true}]));
    }
}
