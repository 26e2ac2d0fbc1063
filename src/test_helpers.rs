//! Shared test utilities for the catalog test suite.
//!
//! Provides a recording [`MockSource`] that stands in for the upstream API,
//! JSON fixture builders shaped like real API responses, direct tree
//! builders for view tests, and lookup helpers that panic with a clear
//! message on a miss.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let source = Arc::new(
//!     MockSource::new()
//!         .menu("mn", menu_json("mn", "branch", &["mn1"]))
//!         .text("mn1", &[translation_json("en", "sujato", true)]),
//! );
//!
//! let tree = vec![branch("mn", vec![leaf("mn1", vec![translation("en", "sujato", true)])])];
//! let entries = texts(&tree);
//! let entry = find_entry(&entries, "mn1/en/sujato");
//! ```

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::endpoints::Endpoints;
use crate::fetch::{BoxFuture, FetchError, JsonSource};
use crate::types::{
    ContentNode, DetailRole, LeafDetail, NodeKind, ParallelsMap, TranslationBody,
    TranslationRecord,
};
use crate::views::FlatEntry;

pub const TEST_API: &str = "https://api.test";

pub fn test_endpoints() -> Endpoints {
    Endpoints::new(TEST_API, "en")
}

// =========================================================================
// Mock upstream
// =========================================================================

/// In-memory API. Unregistered URLs answer HTTP 404. Every call is recorded.
#[derive(Default)]
pub struct MockSource {
    responses: HashMap<String, Value>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: impl Into<String>, value: Value) -> Self {
        self.responses.insert(url.into(), value);
        self
    }

    pub fn menu(self, uid: &str, node: Value) -> Self {
        self.respond(test_endpoints().menu(uid), json!([node]))
    }

    pub fn suttaplex(self, uid: &str, record: Value) -> Self {
        self.respond(test_endpoints().suttaplex(uid), json!([record]))
    }

    pub fn parallels(self, uid: &str, map: Value) -> Self {
        self.respond(test_endpoints().parallels(uid), map)
    }

    pub fn suttas(self, uid: &str, author: &str, lang: &str, body: Value) -> Self {
        self.respond(test_endpoints().suttas(uid, author, lang), body)
    }

    pub fn bilara(self, uid: &str, author: &str, lang: &str, body: Value) -> Self {
        self.respond(test_endpoints().bilarasuttas(uid, author, lang), body)
    }

    pub fn publication_info(self, uid: &str, lang: &str, author: &str, body: Value) -> Self {
        self.respond(test_endpoints().publication_info(uid, lang, author), body)
    }

    /// Register a fully resolvable leaf: menu, suttaplex, empty parallels,
    /// and bodies plus publication info for every translation.
    pub fn text(self, uid: &str, translations: &[Value]) -> Self {
        let mut source = self
            .menu(uid, menu_json(uid, "leaf", &[]))
            .suttaplex(uid, suttaplex_json(uid, translations.to_vec()))
            .parallels(uid, json!({}));
        for t in translations {
            let lang = t["lang"].as_str().unwrap_or_default();
            let author = t["author_uid"].as_str().unwrap_or_default();
            source = source
                .suttas(uid, author, lang, suttas_json(None, None))
                .publication_info(uid, lang, author, json!([{"edition": author}]));
            if t["segmented"].as_bool().unwrap_or(false) {
                source = source.bilara(uid, author, lang, json!({"root_text": {}}));
            }
        }
        source
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == url).count()
    }
}

impl JsonSource for MockSource {
    fn get_json<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FetchError>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(url.to_string());
            tokio::task::yield_now().await;
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        })
    }
}

// =========================================================================
// JSON fixtures shaped like API responses
// =========================================================================

pub fn menu_json(uid: &str, node_type: &str, children: &[&str]) -> Value {
    let children: Vec<Value> = children.iter().map(|c| json!({"uid": c})).collect();
    json!({
        "uid": uid,
        "node_type": node_type,
        "root_name": format!("{uid} root"),
        "translated_name": format!("{uid} title"),
        "children": children,
    })
}

pub fn translation_json(lang: &str, author: &str, segmented: bool) -> Value {
    json!({
        "lang": lang,
        "author_uid": author,
        "author": format!("{author} name"),
        "segmented": segmented,
        "is_root": false,
    })
}

pub fn suttaplex_json(uid: &str, translations: Vec<Value>) -> Value {
    json!({
        "uid": uid,
        "acronym": crate::naming::acronym(uid),
        "original_title": format!("{uid} original"),
        "translations": translations,
    })
}

/// Legacy text body with optional previous/next navigation uids.
pub fn suttas_json(previous: Option<&str>, next: Option<&str>) -> Value {
    let link = |uid: Option<&str>| uid.map_or(Value::Null, |u| json!({"uid": u}));
    json!({
        "translation": {"previous": link(previous), "next": link(next)},
        "root_text": {},
    })
}

// =========================================================================
// Direct tree builders for view tests
// =========================================================================

pub fn fixed_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn node(uid: &str, kind: NodeKind, children: Vec<ContentNode>) -> ContentNode {
    let mut meta = Map::new();
    meta.insert("root_name".into(), json!(format!("{uid} root")));
    ContentNode {
        uid: uid.to_string(),
        kind,
        detail_role: None,
        meta,
        detail: None,
        children,
        fetched_at: fixed_time(),
    }
}

pub fn root(uid: &str, children: Vec<ContentNode>) -> ContentNode {
    node(uid, NodeKind::Root, children)
}

pub fn branch(uid: &str, children: Vec<ContentNode>) -> ContentNode {
    node(uid, NodeKind::Branch, children)
}

/// A leaf whose detail holds the given translations.
pub fn leaf(uid: &str, translations: Vec<TranslationRecord>) -> ContentNode {
    let mut n = node(uid, NodeKind::Leaf, Vec::new());
    let mut meta = Map::new();
    meta.insert("acronym".into(), json!(crate::naming::acronym(uid)));
    n.detail = Some(LeafDetail {
        meta,
        translations,
        parallels: None,
    });
    n
}

/// A detail-bearing branch with the given role, translations and children.
pub fn detail_branch(
    uid: &str,
    role: DetailRole,
    translations: Vec<TranslationRecord>,
    children: Vec<ContentNode>,
) -> ContentNode {
    let mut n = leaf(uid, translations);
    n.kind = NodeKind::Branch;
    n.detail_role = Some(role);
    n.children = children;
    n
}

pub fn with_parallels(mut n: ContentNode, parallels: Value) -> ContentNode {
    if let Some(detail) = n.detail.as_mut() {
        detail.parallels = ParallelsMap::from_value(parallels);
    }
    n
}

/// A resolved translation with a body and no navigation.
pub fn translation(lang: &str, author: &str, segmented: bool) -> TranslationRecord {
    let mut t: TranslationRecord =
        serde_json::from_value(translation_json(lang, author, segmented)).unwrap();
    t.body = Some(TranslationBody {
        suttas: suttas_json(None, None),
        bilara: segmented.then(|| json!({"root_text": {}})),
    });
    t
}

pub fn with_neighbors(
    mut t: TranslationRecord,
    previous: Option<&str>,
    next: Option<&str>,
) -> TranslationRecord {
    if let Some(body) = t.body.as_mut() {
        body.suttas = suttas_json(previous, next);
    }
    t
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a flat entry by path. Panics if not found.
pub fn find_entry<'a>(entries: &'a [FlatEntry], path: &str) -> &'a FlatEntry {
    entries.iter().find(|e| e.path == path).unwrap_or_else(|| {
        panic!("entry '{path}' not found. Available: {:?}", entry_paths(entries))
    })
}

pub fn entry_paths(entries: &[FlatEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.path.as_str()).collect()
}

pub fn entry_uids(entries: &[FlatEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.uid.as_str()).collect()
}

/// Find a node anywhere in a tree by uid. Panics if not found.
pub fn find_node<'a>(nodes: &'a [ContentNode], uid: &str) -> &'a ContentNode {
    fn search<'a>(nodes: &'a [ContentNode], uid: &str) -> Option<&'a ContentNode> {
        nodes
            .iter()
            .find_map(|n| if n.uid == uid { Some(n) } else { search(&n.children, uid) })
    }
    search(nodes, uid).unwrap_or_else(|| {
        let top: Vec<&str> = nodes.iter().map(|n| n.uid.as_str()).collect();
        panic!("node '{uid}' not found under {top:?}")
    })
}

/// Assert no two entries share a path.
pub fn assert_unique_paths(entries: &[FlatEntry]) {
    let mut seen = std::collections::HashSet::new();
    for e in entries {
        assert!(seen.insert(e.path.as_str()), "duplicate path '{}'", e.path);
    }
}
