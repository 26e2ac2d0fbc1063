//! Flattened page views over the unified tree.
//!
//! Stage 2 of the catalog pipeline. Each view walks the tree and produces a
//! flat list of [`FlatEntry`] values, one per page the site will render. Every
//! entry carries a `path` (its URL) and a `breadcrumb` (its ancestry).
//!
//! | View                 | Module        | Emits                                   |
//! |----------------------|---------------|-----------------------------------------|
//! | Index                | [`index`]     | top-level collections                   |
//! | Pitaka               | [`pitaka`]    | every branch that has branch children   |
//! | Chapters             | [`chapter`]   | lowest branches (and pm collections)    |
//! | Leaf-parent chapters | [`chapter`]   | branches that directly contain texts    |
//! | Text metadata        | [`text_meta`] | one per leaf                            |
//! | Texts                | [`text`]      | one per (leaf, language, author)        |
//!
//! Views never mutate the tree and are pure functions of it, so they can run
//! in any order and be recomputed freely.
//!
//! ## Redaction
//!
//! Listing pages do not need text bodies. Bulky payloads are replaced with a
//! `{"redacted": true}` marker so the page still knows the data exists.

pub mod chapter;
pub mod dedup;
pub mod index;
pub mod pitaka;
pub mod range;
pub mod text;
pub mod text_meta;

use crate::types::{ContentNode, DetailRole, TranslationRecord};
use range::RangeUnit;
use serde::Serialize;
use serde_json::{Map, Value, json};

/// One addressable page.
#[derive(Debug, Clone, Serialize)]
pub struct FlatEntry {
    pub uid: String,
    /// URL path, unique within its view.
    pub path: String,
    /// Ancestry path used to render the breadcrumb trail.
    pub breadcrumb: String,
    /// Present only on entries synthesized from a compound text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_unit: Option<RangeUnit>,
    /// Node and translation fields, flattened into the entry.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl FlatEntry {
    pub(crate) fn new(
        uid: impl Into<String>,
        path: impl Into<String>,
        breadcrumb: impl Into<String>,
        mut fields: Map<String, Value>,
    ) -> Self {
        for reserved in ["uid", "path", "breadcrumb", "range_unit"] {
            fields.remove(reserved);
        }
        Self {
            uid: uid.into(),
            path: path.into(),
            breadcrumb: breadcrumb.into(),
            range_unit: None,
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

/// Every view the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Index,
    Pitaka,
    Chapters,
    LeafParentChapters,
    TextMeta,
    Texts,
}

impl ViewKind {
    pub const ALL: [ViewKind; 6] = [
        ViewKind::Index,
        ViewKind::Pitaka,
        ViewKind::Chapters,
        ViewKind::LeafParentChapters,
        ViewKind::TextMeta,
        ViewKind::Texts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::Index => "index",
            ViewKind::Pitaka => "pitaka",
            ViewKind::Chapters => "chapters",
            ViewKind::LeafParentChapters => "chapters-by-leaf-parent",
            ViewKind::TextMeta => "text-meta",
            ViewKind::Texts => "texts",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.name())
    }

    pub fn flatten(&self, tree: &[ContentNode]) -> Vec<FlatEntry> {
        match self {
            ViewKind::Index => index::index(tree),
            ViewKind::Pitaka => pitaka::pitaka(tree),
            ViewKind::Chapters => chapter::chapters(tree),
            ViewKind::LeafParentChapters => chapter::chapters_by_leaf_parent(tree),
            ViewKind::TextMeta => text_meta::text_meta(tree),
            ViewKind::Texts => text::texts(tree),
        }
    }
}

// =============================================================================
// Traversal
// =============================================================================

/// Where a flattener stops descending and emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRule {
    /// Non-leaf with no branch children, or a detail-bearing collection.
    NoBranchChildren,
    /// Any node with at least one leaf child.
    LeafChildren,
    /// Leaves only.
    Leaf,
    /// Any node with resolved translations.
    Translations,
}

impl StopRule {
    pub fn stops_at(&self, node: &ContentNode) -> bool {
        match self {
            StopRule::NoBranchChildren => {
                (!node.is_leaf() && !node.has_branch_child())
                    || node.detail_role == Some(DetailRole::Collection)
            }
            StopRule::LeafChildren => node.has_leaf_child(),
            StopRule::Leaf => node.is_leaf(),
            StopRule::Translations => !node.translations().is_empty(),
        }
    }
}

/// Depth-first walk calling `visit` with each stopping node and its
/// ancestor-joined path (including the node itself).
pub(crate) fn walk<'a, F>(nodes: &'a [ContentNode], rule: StopRule, parent: &str, visit: &mut F)
where
    F: FnMut(&'a ContentNode, &str),
{
    for node in nodes {
        let path = join_path(parent, &node.uid);
        if rule.stops_at(node) {
            visit(node, &path);
        } else {
            walk(&node.children, rule, &path, visit);
        }
    }
}

pub(crate) fn join_path(parent: &str, uid: &str) -> String {
    if parent.is_empty() {
        uid.to_string()
    } else {
        format!("{parent}/{uid}")
    }
}

// =============================================================================
// Field rendering
// =============================================================================

/// How bulky payloads are stripped from emitted node fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redaction {
    /// Translation bodies become markers, recursively through children.
    Bodies,
    /// Whole translation lists become a single marker, recursively.
    Translations,
    /// Children are kept (bodies redacted); grandchildren become a marker.
    GrandChildren,
}

pub(crate) fn redacted() -> Value {
    json!({"redacted": true})
}

/// Scalar fields of a node: menu meta, suttaplex meta, identity, timestamp.
pub(crate) fn base_fields(node: &ContentNode) -> Map<String, Value> {
    let mut fields = node.meta.clone();
    if let Some(detail) = &node.detail {
        fields.extend(detail.meta.clone());
    }
    fields.insert("uid".into(), Value::String(node.uid.clone()));
    fields.insert("node_type".into(), Value::String(node.kind.as_str().into()));
    if let Some(role) = node.detail_role {
        fields.insert("detail_role".into(), json!(role));
    }
    fields.insert("fetched_at".into(), Value::String(node.fetched_at.to_rfc3339()));
    fields
}

/// Full node fields with translations, parallels and children, redacted.
pub(crate) fn node_fields(node: &ContentNode, redaction: Redaction) -> Map<String, Value> {
    let mut fields = base_fields(node);

    if let Some(detail) = &node.detail {
        let translations = match redaction {
            Redaction::Translations => Value::Array(vec![redacted()]),
            Redaction::Bodies | Redaction::GrandChildren => Value::Array(
                detail
                    .translations
                    .iter()
                    .map(|t| Value::Object(translation_fields(t, false)))
                    .collect(),
            ),
        };
        fields.insert("translations".into(), translations);
        fields.insert(
            "parallels".into(),
            detail
                .parallels
                .as_ref()
                .map_or(Value::Null, |p| json!(p)),
        );
    }

    if !node.children.is_empty() {
        let children = match redaction {
            Redaction::Bodies | Redaction::Translations => node
                .children
                .iter()
                .map(|c| Value::Object(node_fields(c, redaction)))
                .collect(),
            Redaction::GrandChildren => node
                .children
                .iter()
                .map(|c| {
                    let mut child = node_fields(c, Redaction::Bodies);
                    if !c.children.is_empty() {
                        child.insert("children".into(), Value::Array(vec![redacted()]));
                    }
                    Value::Object(child)
                })
                .collect(),
        };
        fields.insert("children".into(), Value::Array(children));
    }

    fields
}

/// Fields of one translation, with bodies inline or redacted.
pub(crate) fn translation_fields(t: &TranslationRecord, include_bodies: bool) -> Map<String, Value> {
    let mut fields = t.meta.clone();
    fields.insert("lang".into(), Value::String(t.lang.clone()));
    fields.insert("author_uid".into(), Value::String(t.author_uid.clone()));
    fields.insert("segmented".into(), Value::Bool(t.segmented));
    fields.insert("is_root".into(), Value::Bool(t.is_root));

    if let Some(body) = &t.body {
        if include_bodies {
            fields.insert("suttas".into(), body.suttas.clone());
            if let Some(bilara) = &body.bilara {
                fields.insert("bilara".into(), bilara.clone());
            }
        } else {
            fields.insert("suttas".into(), redacted());
            if body.bilara.is_some() {
                fields.insert("bilara".into(), redacted());
            }
        }
    }
    if let Some(info) = &t.publication_info {
        fields.insert("publication_info".into(), info.clone());
    }
    fields
}
