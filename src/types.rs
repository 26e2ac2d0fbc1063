//! Shared types for the unified catalog tree.
//!
//! The tree is built once by [`crate::tree`] and read, never mutated, by every
//! view in [`crate::views`]. Nodes own their payloads; views copy what they
//! need into [`FlatEntry`](crate::views::FlatEntry) values.
//!
//! Descriptive metadata (titles, blurbs, acronyms) is kept as free-form JSON
//! maps because the upstream API adds and renames fields without notice, and
//! nothing in this crate interprets them beyond display titles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Position of a node in the upstream hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Branch,
    Leaf,
}

impl NodeKind {
    /// Classify a menu `node_type` value. Anything unrecognised is a branch.
    pub fn from_node_type(node_type: Option<&str>) -> Self {
        match node_type {
            Some("root") => NodeKind::Root,
            Some("leaf") => NodeKind::Leaf,
            _ => NodeKind::Branch,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Branch => "branch",
            NodeKind::Leaf => "leaf",
        }
    }
}

/// Capability of a branch that also carries leaf detail.
///
/// Pātimokkha collections are structurally branches but have their own
/// suttaplex record. A `Collection` is additionally a chapter boundary; a
/// `Section` is only resolved for detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailRole {
    Collection,
    Section,
}

/// One node of the unified tree.
#[derive(Debug, Clone)]
pub struct ContentNode {
    pub uid: String,
    pub kind: NodeKind,
    /// Set only on branches that matched a detail-bearing naming rule.
    pub detail_role: Option<DetailRole>,
    /// Menu fields other than `uid`, `node_type` and `children`.
    pub meta: Map<String, Value>,
    /// Leaf detail; also present on detail-bearing branches when resolved.
    pub detail: Option<LeafDetail>,
    pub children: Vec<ContentNode>,
    /// When the menu response for this node was originally retrieved.
    pub fetched_at: DateTime<Utc>,
}

impl ContentNode {
    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    pub fn has_branch_child(&self) -> bool {
        self.children.iter().any(|c| c.kind == NodeKind::Branch)
    }

    pub fn has_leaf_child(&self) -> bool {
        self.children.iter().any(|c| c.kind == NodeKind::Leaf)
    }

    /// Resolved translations, empty when the node has no detail.
    pub fn translations(&self) -> &[TranslationRecord] {
        self.detail
            .as_ref()
            .map(|d| d.translations.as_slice())
            .unwrap_or_default()
    }

    pub fn parallels(&self) -> Option<&ParallelsMap> {
        self.detail.as_ref().and_then(|d| d.parallels.as_ref())
    }

    /// Best human-readable title, falling back to the uid.
    pub fn display_title(&self) -> &str {
        ["translated_name", "translated_title", "root_name", "original_title"]
            .iter()
            .find_map(|key| {
                self.detail
                    .as_ref()
                    .and_then(|d| d.meta.get(*key))
                    .or_else(|| self.meta.get(*key))
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
            })
            .unwrap_or(&self.uid)
    }
}

/// Suttaplex record attached to a leaf.
#[derive(Debug, Clone, Default)]
pub struct LeafDetail {
    /// Suttaplex fields other than `translations`.
    pub meta: Map<String, Value>,
    /// Translations that passed the filter and whose bodies resolved.
    pub translations: Vec<TranslationRecord>,
    /// `None` when the parallels lookup failed or was malformed.
    pub parallels: Option<ParallelsMap>,
}

/// One (language, contributor) rendering of a leaf.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationRecord {
    pub lang: String,
    pub author_uid: String,
    #[serde(default)]
    pub segmented: bool,
    #[serde(default)]
    pub is_root: bool,
    #[serde(flatten)]
    pub meta: Map<String, Value>,
    #[serde(skip)]
    pub body: Option<TranslationBody>,
    #[serde(skip)]
    pub publication_info: Option<Value>,
}

/// Fetched text of a translation.
#[derive(Debug, Clone)]
pub struct TranslationBody {
    /// Legacy `/suttas` response; always present, carries prev/next navigation.
    pub suttas: Value,
    /// Segmented `/bilarasuttas` response, only for segmented translations.
    pub bilara: Option<Value>,
}

impl TranslationBody {
    pub fn previous_uid(&self) -> Option<&str> {
        self.neighbor_uid("previous")
    }

    pub fn next_uid(&self) -> Option<&str> {
        self.neighbor_uid("next")
    }

    fn neighbor_uid(&self, direction: &str) -> Option<&str> {
        self.suttas
            .get("translation")?
            .get(direction)?
            .get("uid")?
            .as_str()
            .filter(|uid| !uid.is_empty())
    }
}

/// Cross-reference data keyed by unit id or unit-range pattern.
///
/// Keys keep upstream order; values are arrays of parallel descriptors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParallelsMap(Map<String, Value>);

impl ParallelsMap {
    /// Accept only a JSON object; anything else is not a parallels map.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Total number of cross-reference descriptors across all keys.
    pub fn reference_count(&self) -> usize {
        self.0
            .values()
            .map(|v| v.as_array().map(Vec::len).unwrap_or(0))
            .sum()
    }
}

impl FromIterator<(String, Value)> for ParallelsMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
