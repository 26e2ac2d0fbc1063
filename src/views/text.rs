//! Text view: one reading page per (text, language, author).
//!
//! Descends until a node has resolved translations, then emits one entry per
//! translation at `{uid}/{lang}/{author_uid}` without descending further.
//! The entry merges the node's fields (minus its translation list and
//! children, plus its full parallels) with the translation's own fields,
//! bodies included.
//!
//! For a compound text and a segmented translation, the per-unit entries
//! from [`range`](super::range) are emitted first, followed by the compound
//! entry itself. Unit paths share the same uniqueness guard.

use super::dedup::PathGuard;
use super::range::{self, Neighbors};
use super::{FlatEntry, StopRule, base_fields, translation_fields, walk};
use crate::naming::UnitRange;
use crate::types::ContentNode;
use serde_json::{Value, json};

pub fn texts(tree: &[ContentNode]) -> Vec<FlatEntry> {
    let mut guard = PathGuard::new();
    let mut entries = Vec::new();
    walk(tree, StopRule::Translations, "", &mut |node, ancestry| {
        emit_translations(node, ancestry, &mut guard, &mut entries);
    });
    entries
}

fn emit_translations(
    node: &ContentNode,
    ancestry: &str,
    guard: &mut PathGuard,
    out: &mut Vec<FlatEntry>,
) {
    let compound = UnitRange::parse_compound(&node.uid);
    let mut base = base_fields(node);
    base.insert(
        "parallels".into(),
        node.parallels().map_or(Value::Null, |p| json!(p)),
    );

    for t in node.translations() {
        let path = format!("{}/{}/{}", node.uid, t.lang, t.author_uid);
        if !guard.admit(&path) {
            continue;
        }
        let mut fields = base.clone();
        fields.extend(translation_fields(t, true));

        if let Some(range) = compound.as_ref().filter(|_| t.segmented) {
            let neighbors = Neighbors {
                previous: t.body.as_ref().and_then(|b| b.previous_uid()),
                next: t.body.as_ref().and_then(|b| b.next_uid()),
            };
            for unit in range::expand(&node.uid, range, neighbors, node.parallels()) {
                let unit_path = format!("{}/{}/{}", unit.uid, t.lang, t.author_uid);
                if !guard.admit(&unit_path) {
                    continue;
                }
                let mut unit_fields = fields.clone();
                unit_fields.insert("acronym".into(), Value::String(unit.acronym.clone()));
                let mut entry = FlatEntry::new(
                    unit.uid.as_str(),
                    unit_path,
                    replace_last_segment(ancestry, &unit.uid),
                    unit_fields,
                );
                entry.range_unit = Some(unit);
                out.push(entry);
            }
        }

        out.push(FlatEntry::new(node.uid.as_str(), path, ancestry, fields));
    }
}

fn replace_last_segment(path: &str, segment: &str) -> String {
    match path.rsplit_once('/') {
        Some((parent, _)) => format!("{parent}/{segment}"),
        None => segment.to_string(),
    }
}
