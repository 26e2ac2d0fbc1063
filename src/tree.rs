//! Unified tree construction.
//!
//! Stage 1 of the catalog pipeline. Walks the upstream menu hierarchy from a
//! root uid, attaching leaf detail (suttaplex record, filtered translations
//! with their text bodies, parallels) wherever a text lives.
//!
//! ## Resolution Rules
//!
//! ```text
//! menu(uid) ──► leaf?  ──yes──► suttaplex + parallels ──► translations
//!                 │                                        ├─ suttas body (always)
//!                 no                                       ├─ bilara body (segmented)
//!                 │                                        └─ publication info
//!                 ├─ detail-bearing branch? resolve detail as for a leaf
//!                 └─ children, in waves of `max_concurrent`
//! ```
//!
//! ## Failure Handling
//!
//! Nothing here is fatal. Each failure degrades exactly one thing:
//!
//! | Failure                         | Effect                              |
//! |---------------------------------|-------------------------------------|
//! | menu request / empty response   | node (and its subtree) omitted      |
//! | suttaplex request / malformed   | leaf kept without detail            |
//! | parallels request / malformed   | detail kept, parallels absent       |
//! | suttas or bilara body           | that translation dropped            |
//! | publication info / error reply  | translation kept without it, counted|
//!
//! Sibling order always follows the upstream menu.

use crate::config::{CatalogConfig, DetailBranchesConfig, TranslationsConfig};
use crate::endpoints::Endpoints;
use crate::fetch::{BoxFuture, Fetcher, JsonSource};
use crate::limiter::WaveLimiter;
use crate::types::{
    ContentNode, DetailRole, LeafDetail, NodeKind, ParallelsMap, TranslationBody,
    TranslationRecord,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Which translations are kept on a leaf.
#[derive(Debug, Clone)]
pub struct TranslationFilter {
    languages: Vec<String>,
    include_root: bool,
}

impl TranslationFilter {
    pub fn new(languages: Vec<String>, include_root: bool) -> Self {
        Self {
            languages,
            include_root,
        }
    }

    pub fn from_config(config: &TranslationsConfig) -> Self {
        Self::new(config.languages.clone(), config.include_root)
    }

    pub fn accepts(&self, lang: &str, is_root: bool) -> bool {
        (self.include_root && is_root) || self.languages.iter().any(|l| l == "*" || l == lang)
    }

    fn accepts_value(&self, translation: &Value) -> bool {
        let lang = translation.get("lang").and_then(Value::as_str).unwrap_or_default();
        let is_root = translation
            .get("is_root")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        self.accepts(lang, is_root)
    }

    /// Apply the filter to the translation list embedded in a suttas body.
    fn retain_in_body(&self, suttas: &mut Value) {
        if let Some(list) = suttas
            .pointer_mut("/suttaplex/translations")
            .and_then(Value::as_array_mut)
        {
            list.retain(|t| self.accepts_value(t));
        }
    }
}

impl Default for TranslationFilter {
    fn default() -> Self {
        Self::from_config(&TranslationsConfig::default())
    }
}

/// Naming rule for branches that also carry leaf detail.
#[derive(Debug, Clone)]
pub struct DetailBranchRule {
    suffixes: Vec<String>,
    infixes: Vec<String>,
}

impl DetailBranchRule {
    pub fn new(suffixes: Vec<String>, infixes: Vec<String>) -> Self {
        Self { suffixes, infixes }
    }

    pub fn from_config(config: &DetailBranchesConfig) -> Self {
        Self::new(config.suffixes.clone(), config.infixes.clone())
    }

    /// Role for a branch uid; suffix matches win over infix matches.
    pub fn role_for(&self, uid: &str) -> Option<DetailRole> {
        if self.suffixes.iter().any(|s| uid.ends_with(s.as_str())) {
            Some(DetailRole::Collection)
        } else if self.infixes.iter().any(|s| uid.contains(s.as_str())) {
            Some(DetailRole::Section)
        } else {
            None
        }
    }
}

impl Default for DetailBranchRule {
    fn default() -> Self {
        Self::from_config(&DetailBranchesConfig::default())
    }
}

/// Knobs for [`TreeBuilder`].
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_concurrent: usize,
    pub translations: TranslationFilter,
    pub detail_branches: DetailBranchRule,
    pub publication_info: bool,
}

impl TreeOptions {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            max_concurrent: config.fetch.max_concurrent,
            translations: TranslationFilter::from_config(&config.translations),
            detail_branches: DetailBranchRule::from_config(&config.detail_branches),
            publication_info: config.fetch.publication_info,
        }
    }
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default())
    }
}

pub struct TreeBuilder<S> {
    fetcher: Fetcher<S>,
    endpoints: Endpoints,
    limiter: WaveLimiter,
    options: TreeOptions,
}

impl<S: JsonSource> TreeBuilder<S> {
    pub fn new(fetcher: Fetcher<S>, endpoints: Endpoints, options: TreeOptions) -> Self {
        Self {
            fetcher,
            endpoints,
            limiter: WaveLimiter::new(options.max_concurrent),
            options,
        }
    }

    pub fn fetcher(&self) -> &Fetcher<S> {
        &self.fetcher
    }

    /// Build the subtree rooted at `uid`. `None` when the menu lookup fails.
    pub fn build_node(&self, uid: String, depth: usize) -> BoxFuture<'_, Option<ContentNode>> {
        Box::pin(async move {
            let fetched = match self.fetcher.fetch_json(&self.endpoints.menu(&uid)).await {
                Ok(f) => f,
                Err(e) => {
                    warn!(%uid, depth, error = %e, "menu fetch failed, omitting subtree");
                    return None;
                }
            };
            let Some(mut menu) = first_object(fetched.value) else {
                warn!(%uid, depth, "menu response has no node, omitting subtree");
                return None;
            };

            let node_uid = match menu.remove("uid") {
                Some(Value::String(s)) if !s.is_empty() => s,
                _ => uid,
            };
            let kind = NodeKind::from_node_type(menu.remove("node_type").as_ref().and_then(Value::as_str));
            let child_uids = child_uids(menu.remove("children"));

            let mut node = ContentNode {
                uid: node_uid,
                kind,
                detail_role: None,
                meta: menu,
                detail: None,
                children: Vec::new(),
                fetched_at: fetched.fetched_at,
            };

            if node.is_leaf() {
                node.detail = self.resolve_detail(&node.uid, depth).await;
                return Some(node);
            }
            if child_uids.is_empty() {
                return Some(node);
            }

            if let Some(role) = self.options.detail_branches.role_for(&node.uid) {
                debug!(uid = %node.uid, ?role, "resolving detail-bearing branch");
                node.detail_role = Some(role);
                node.detail = self.resolve_detail(&node.uid, depth).await;
            }

            let children = self
                .limiter
                .run(child_uids.into_iter().map(|c| self.build_node(c, depth + 1)))
                .await;
            node.children = children.into_iter().flatten().collect();
            Some(node)
        })
    }

    async fn resolve_detail(&self, uid: &str, depth: usize) -> Option<LeafDetail> {
        let record = match self.fetcher.fetch_json(&self.endpoints.suttaplex(uid)).await {
            Ok(f) => first_object(f.value),
            Err(e) => {
                warn!(%uid, depth, error = %e, "suttaplex fetch failed, keeping bare node");
                return None;
            }
        };
        let Some(mut meta) = record else {
            warn!(%uid, depth, "suttaplex response malformed, keeping bare node");
            return None;
        };

        let parallels = match self.fetcher.fetch_json(&self.endpoints.parallels(uid)).await {
            Ok(f) => {
                let map = ParallelsMap::from_value(f.value);
                if map.is_none() {
                    warn!(%uid, "parallels response is not an object");
                }
                map
            }
            Err(e) => {
                warn!(%uid, error = %e, "parallels fetch failed");
                None
            }
        };

        let candidates: Vec<TranslationRecord> = match meta.remove("translations") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match serde_json::from_value::<TranslationRecord>(item) {
                    Ok(t) => Some(t),
                    Err(e) => {
                        warn!(%uid, error = %e, "skipping malformed translation record");
                        None
                    }
                })
                .filter(|t| self.options.translations.accepts(&t.lang, t.is_root))
                .collect(),
            _ => Vec::new(),
        };

        let translations = self
            .limiter
            .run(candidates.into_iter().map(|t| self.resolve_translation(uid, t)))
            .await
            .into_iter()
            .flatten()
            .collect();

        Some(LeafDetail {
            meta,
            translations,
            parallels,
        })
    }

    async fn resolve_translation(
        &self,
        uid: &str,
        mut translation: TranslationRecord,
    ) -> Option<TranslationRecord> {
        let (lang, author) = (translation.lang.as_str(), translation.author_uid.as_str());

        let bilara = if translation.segmented {
            match self
                .fetcher
                .fetch_json(&self.endpoints.bilarasuttas(uid, author, lang))
                .await
            {
                Ok(f) => Some(f.value),
                Err(e) => {
                    warn!(%uid, %lang, %author, error = %e, "segmented text fetch failed, dropping translation");
                    return None;
                }
            }
        } else {
            None
        };

        let mut suttas = match self
            .fetcher
            .fetch_json(&self.endpoints.suttas(uid, author, lang))
            .await
        {
            Ok(f) => f.value,
            Err(e) => {
                warn!(%uid, %lang, %author, error = %e, "text fetch failed, dropping translation");
                return None;
            }
        };
        self.options.translations.retain_in_body(&mut suttas);

        let publication_info = if self.options.publication_info {
            self.publication_info(uid, &translation).await
        } else {
            None
        };

        translation.body = Some(TranslationBody { suttas, bilara });
        translation.publication_info = publication_info;
        Some(translation)
    }

    async fn publication_info(&self, uid: &str, t: &TranslationRecord) -> Option<Value> {
        let url = self.endpoints.publication_info(uid, &t.lang, &t.author_uid);
        let value = match self.fetcher.fetch_json(&url).await {
            Ok(f) => f.value,
            Err(e) => {
                self.fetcher.stats().record_publication_info_failure();
                debug!(%uid, lang = %t.lang, author = %t.author_uid, error = %e, "no publication info");
                return None;
            }
        };
        if value.get("error").is_some() {
            self.fetcher.stats().record_publication_info_miss();
            debug!(%uid, lang = %t.lang, author = %t.author_uid, "publication info returned an error");
            return None;
        }
        match value {
            Value::Array(mut items) if !items.is_empty() => Some(items.swap_remove(0)),
            _ => None,
        }
    }
}

/// First element of an array response, if it is an object.
fn first_object(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Array(items) => match items.into_iter().next() {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

fn child_uids(children: Option<Value>) -> Vec<String> {
    match children {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|c| c.get("uid").and_then(Value::as_str))
            .filter(|uid| !uid.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use serde_json::json;
    use std::sync::Arc;

    fn builder(source: &Arc<MockSource>) -> TreeBuilder<Arc<MockSource>> {
        TreeBuilder::new(
            Fetcher::new(source.clone(), None),
            test_endpoints(),
            TreeOptions {
                max_concurrent: 4,
                ..TreeOptions::default()
            },
        )
    }

    // =========================================================================
    // Filters and rules
    // =========================================================================

    #[test]
    fn filter_keeps_language_and_root() {
        let filter = TranslationFilter::default();
        assert!(filter.accepts("en", false));
        assert!(filter.accepts("pli", true));
        assert!(!filter.accepts("de", false));
    }

    #[test]
    fn wildcard_filter_keeps_everything() {
        let filter = TranslationFilter::new(vec!["*".into()], false);
        assert!(filter.accepts("de", false));
    }

    #[test]
    fn root_texts_can_be_excluded() {
        let filter = TranslationFilter::new(vec!["en".into()], false);
        assert!(!filter.accepts("pli", true));
    }

    #[test]
    fn detail_branch_roles() {
        let rule = DetailBranchRule::default();
        assert_eq!(rule.role_for("pli-tv-bu-pm"), Some(DetailRole::Collection));
        assert_eq!(rule.role_for("pli-tv-bu-pm-pj"), Some(DetailRole::Section));
        assert_eq!(rule.role_for("pli-tv-bu-vb"), None);
    }

    #[test]
    fn first_object_requires_object() {
        assert!(first_object(json!([{"uid": "x"}])).is_some());
        assert!(first_object(json!([])).is_none());
        assert!(first_object(json!([null])).is_none());
        assert!(first_object(json!({"uid": "x"})).is_none());
    }

    // =========================================================================
    // Structure
    // =========================================================================

    #[tokio::test]
    async fn builds_branches_in_menu_order() {
        let source = Arc::new(
            MockSource::new()
                .menu("sutta", menu_json("sutta", "root", &["dn", "mn"]))
                .menu("dn", menu_json("dn", "branch", &["dn1"]))
                .menu("mn", menu_json("mn", "branch", &["mn1"]))
                .text("dn1", &[translation_json("en", "sujato", false)])
                .text("mn1", &[translation_json("en", "sujato", false)]),
        );

        let tree = builder(&source).build_node("sutta".into(), 0).await.unwrap();

        assert_eq!(tree.kind, NodeKind::Root);
        let uids: Vec<&str> = tree.children.iter().map(|c| c.uid.as_str()).collect();
        assert_eq!(uids, vec!["dn", "mn"]);
        let dn1 = find_node(&tree.children, "dn1");
        assert!(dn1.is_leaf());
        assert_eq!(dn1.translations().len(), 1);
        assert!(!tree.meta.contains_key("children"));
    }

    #[tokio::test]
    async fn failed_child_is_pruned() {
        let source = Arc::new(
            MockSource::new()
                .menu("sutta", menu_json("sutta", "root", &["dn", "missing", "mn"]))
                .menu("dn", menu_json("dn", "branch", &[]))
                .menu("mn", menu_json("mn", "branch", &[])),
        );

        let tree = builder(&source).build_node("sutta".into(), 0).await.unwrap();
        let uids: Vec<&str> = tree.children.iter().map(|c| c.uid.as_str()).collect();
        assert_eq!(uids, vec!["dn", "mn"]);
    }

    #[tokio::test]
    async fn unreachable_root_is_absent() {
        let source = Arc::new(MockSource::new());
        assert!(builder(&source).build_node("sutta".into(), 0).await.is_none());
    }

    #[tokio::test]
    async fn empty_menu_response_is_absent() {
        let source = Arc::new(MockSource::new().respond(test_endpoints().menu("sutta"), json!([])));
        assert!(builder(&source).build_node("sutta".into(), 0).await.is_none());
    }

    // =========================================================================
    // Leaf detail
    // =========================================================================

    #[tokio::test]
    async fn leaf_keeps_filtered_translations() {
        let source = Arc::new(MockSource::new().text(
            "mn1",
            &[
                translation_json("en", "sujato", true),
                translation_json("de", "sabbamitta", false),
                json!({"lang": "pli", "author_uid": "ms", "is_root": true, "segmented": true}),
            ],
        ));

        let leaf = builder(&source).build_node("mn1".into(), 3).await.unwrap();

        let langs: Vec<&str> = leaf.translations().iter().map(|t| t.lang.as_str()).collect();
        assert_eq!(langs, vec!["en", "pli"]);
        let en = &leaf.translations()[0];
        let body = en.body.as_ref().unwrap();
        assert!(body.bilara.is_some());
        assert_eq!(en.publication_info, Some(json!({"edition": "sujato"})));
    }

    #[tokio::test]
    async fn unsegmented_translation_skips_bilara() {
        let source = Arc::new(MockSource::new().text("mn1", &[translation_json("en", "horner", false)]));

        let leaf = builder(&source).build_node("mn1".into(), 0).await.unwrap();

        assert_eq!(leaf.translations().len(), 1);
        assert!(leaf.translations()[0].body.as_ref().unwrap().bilara.is_none());
        assert_eq!(
            source.call_count(&test_endpoints().bilarasuttas("mn1", "horner", "en")),
            0
        );
    }

    #[tokio::test]
    async fn failed_suttaplex_keeps_bare_leaf() {
        let source = Arc::new(MockSource::new().menu("mn1", menu_json("mn1", "leaf", &[])));

        let leaf = builder(&source).build_node("mn1".into(), 0).await.unwrap();

        assert!(leaf.is_leaf());
        assert!(leaf.detail.is_none());
        assert!(leaf.translations().is_empty());
    }

    #[tokio::test]
    async fn failed_text_body_drops_translation() {
        let source = Arc::new(
            MockSource::new()
                .menu("mn1", menu_json("mn1", "leaf", &[]))
                .suttaplex(
                    "mn1",
                    suttaplex_json(
                        "mn1",
                        vec![
                            translation_json("en", "sujato", false),
                            translation_json("en", "horner", false),
                        ],
                    ),
                )
                .suttas("mn1", "sujato", "en", suttas_json(None, None)),
        );

        let leaf = builder(&source).build_node("mn1".into(), 0).await.unwrap();

        let authors: Vec<&str> = leaf
            .translations()
            .iter()
            .map(|t| t.author_uid.as_str())
            .collect();
        assert_eq!(authors, vec!["sujato"]);
    }

    #[tokio::test]
    async fn failed_bilara_drops_segmented_translation() {
        let source = Arc::new(
            MockSource::new()
                .menu("mn1", menu_json("mn1", "leaf", &[]))
                .suttaplex("mn1", suttaplex_json("mn1", vec![translation_json("en", "sujato", true)]))
                .suttas("mn1", "sujato", "en", suttas_json(None, None)),
        );

        let leaf = builder(&source).build_node("mn1".into(), 0).await.unwrap();
        assert!(leaf.detail.is_some());
        assert!(leaf.translations().is_empty());
    }

    #[tokio::test]
    async fn parallels_absent_on_failure() {
        let source = Arc::new(
            MockSource::new()
                .menu("mn1", menu_json("mn1", "leaf", &[]))
                .suttaplex("mn1", suttaplex_json("mn1", vec![])),
        );

        let leaf = builder(&source).build_node("mn1".into(), 0).await.unwrap();
        assert!(leaf.detail.is_some());
        assert!(leaf.parallels().is_none());
    }

    #[tokio::test]
    async fn publication_info_error_is_counted_not_fatal() {
        let source = Arc::new(
            MockSource::new()
                .menu("mn1", menu_json("mn1", "leaf", &[]))
                .suttaplex("mn1", suttaplex_json("mn1", vec![translation_json("en", "sujato", false)]))
                .suttas("mn1", "sujato", "en", suttas_json(None, None))
                .parallels("mn1", json!({}))
                .publication_info("mn1", "en", "sujato", json!({"error": "not found"})),
        );

        let b = builder(&source);
        let leaf = b.build_node("mn1".into(), 0).await.unwrap();

        assert_eq!(leaf.translations().len(), 1);
        assert!(leaf.translations()[0].publication_info.is_none());
        let summary = b.fetcher().stats().summary();
        assert_eq!(summary.publication_info_misses, 1);
        assert_eq!(summary.publication_info_failures, 0);
    }

    #[tokio::test]
    async fn failed_publication_info_request_is_counted_as_failure() {
        let source = Arc::new(
            MockSource::new()
                .menu("mn1", menu_json("mn1", "leaf", &[]))
                .suttaplex("mn1", suttaplex_json("mn1", vec![translation_json("en", "sujato", false)]))
                .suttas("mn1", "sujato", "en", suttas_json(None, None))
                .parallels("mn1", json!({})),
        );

        let b = builder(&source);
        let leaf = b.build_node("mn1".into(), 0).await.unwrap();

        assert_eq!(leaf.translations().len(), 1);
        let summary = b.fetcher().stats().summary();
        assert_eq!(summary.publication_info_misses, 1);
        assert_eq!(summary.publication_info_failures, 1);
        assert_eq!(summary.failures, 1);
    }

    #[tokio::test]
    async fn nested_translation_list_is_filtered() {
        let body = json!({
            "translation": {},
            "suttaplex": {"translations": [
                {"lang": "en", "author_uid": "sujato"},
                {"lang": "fr", "author_uid": "x"},
                {"lang": "pli", "author_uid": "ms", "is_root": true}
            ]}
        });
        let source = Arc::new(
            MockSource::new()
                .menu("mn1", menu_json("mn1", "leaf", &[]))
                .suttaplex("mn1", suttaplex_json("mn1", vec![translation_json("en", "sujato", false)]))
                .suttas("mn1", "sujato", "en", body),
        );

        let leaf = builder(&source).build_node("mn1".into(), 0).await.unwrap();

        let suttas = &leaf.translations()[0].body.as_ref().unwrap().suttas;
        let nested = suttas["suttaplex"]["translations"].as_array().unwrap();
        assert_eq!(nested.len(), 2);
    }

    // =========================================================================
    // Detail-bearing branches
    // =========================================================================

    #[tokio::test]
    async fn detail_bearing_branch_gets_detail_and_children() {
        let source = Arc::new(
            MockSource::new()
                .menu("pli-tv-bu-pm", menu_json("pli-tv-bu-pm", "branch", &["pli-tv-bu-pm-pj"]))
                .suttaplex(
                    "pli-tv-bu-pm",
                    suttaplex_json("pli-tv-bu-pm", vec![translation_json("en", "brahmali", false)]),
                )
                .suttas("pli-tv-bu-pm", "brahmali", "en", suttas_json(None, None))
                .menu("pli-tv-bu-pm-pj", menu_json("pli-tv-bu-pm-pj", "branch", &["pli-tv-bu-pm-pj1"]))
                .text("pli-tv-bu-pm-pj1", &[translation_json("en", "brahmali", false)]),
        );

        let pm = builder(&source)
            .build_node("pli-tv-bu-pm".into(), 2)
            .await
            .unwrap();

        assert_eq!(pm.kind, NodeKind::Branch);
        assert_eq!(pm.detail_role, Some(DetailRole::Collection));
        assert_eq!(pm.translations().len(), 1);
        assert_eq!(pm.children.len(), 1);

        let section = &pm.children[0];
        assert_eq!(section.detail_role, Some(DetailRole::Section));
        assert!(section.detail.is_none());
        assert_eq!(section.children[0].translations().len(), 1);
    }

    #[tokio::test]
    async fn leaf_detail_is_fetched_once() {
        let source = Arc::new(
            MockSource::new()
                .menu("root1", menu_json("root1", "branch", &["leaf1"]))
                .text("leaf1", &[translation_json("en", "sujato", true)]),
        );

        let tree = builder(&source).build_node("root1".into(), 0).await.unwrap();

        assert_eq!(tree.children.len(), 1);
        let e = test_endpoints();
        assert_eq!(source.call_count(&e.suttaplex("leaf1")), 1);
        assert_eq!(source.call_count(&e.parallels("leaf1")), 1);
        assert_eq!(source.call_count(&e.suttas("leaf1", "sujato", "en")), 1);
        assert_eq!(source.call_count(&e.bilarasuttas("leaf1", "sujato", "en")), 1);
    }

    #[tokio::test]
    async fn detail_bearing_branch_detail_is_fetched_once() {
        let source = Arc::new(
            MockSource::new()
                .menu("pli-tv-bu-pm", menu_json("pli-tv-bu-pm", "branch", &["pli-tv-bu-pm1"]))
                .suttaplex("pli-tv-bu-pm", suttaplex_json("pli-tv-bu-pm", vec![]))
                .text("pli-tv-bu-pm1", &[translation_json("en", "brahmali", false)]),
        );

        builder(&source).build_node("pli-tv-bu-pm".into(), 0).await.unwrap();

        let e = test_endpoints();
        assert_eq!(source.call_count(&e.suttaplex("pli-tv-bu-pm")), 1);
        assert_eq!(source.call_count(&e.suttaplex("pli-tv-bu-pm1")), 1);
    }

    #[tokio::test]
    async fn ordinary_branch_is_not_resolved() {
        let source = Arc::new(
            MockSource::new()
                .menu("mn", menu_json("mn", "branch", &["mn1"]))
                .text("mn1", &[translation_json("en", "sujato", false)]),
        );

        builder(&source).build_node("mn".into(), 1).await.unwrap();
        assert_eq!(source.call_count(&test_endpoints().suttaplex("mn")), 0);
    }
}
