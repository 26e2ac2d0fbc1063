//! Upstream API URL construction.
//!
//! Every resource the tree builder touches is addressed here so that URL
//! shapes live in one place and the response cache keys stay stable.

use crate::config::ApiConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
    language: String,
}

impl Endpoints {
    pub fn new(base: impl Into<String>, language: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
            language: language.into(),
        }
    }

    pub fn from_config(api: &ApiConfig) -> Self {
        Self::new(&api.base_url, &api.language)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn menu(&self, uid: &str) -> String {
        format!("{}/menu/{}?language={}", self.base, uid, self.language)
    }

    pub fn suttaplex(&self, uid: &str) -> String {
        format!("{}/suttaplex/{}?language={}", self.base, uid, self.language)
    }

    pub fn parallels(&self, uid: &str) -> String {
        format!("{}/parallels/{}", self.base, uid)
    }

    /// Segmented text body for one translation.
    pub fn bilarasuttas(&self, uid: &str, author_uid: &str, lang: &str) -> String {
        format!("{}/bilarasuttas/{}/{}?lang={}", self.base, uid, author_uid, lang)
    }

    /// Legacy text body; also carries previous/next navigation.
    pub fn suttas(&self, uid: &str, author_uid: &str, lang: &str) -> String {
        format!(
            "{}/suttas/{}/{}?lang={}&siteLanguage={}",
            self.base, uid, author_uid, lang, self.language
        )
    }

    pub fn publication_info(&self, uid: &str, lang: &str, author_uid: &str) -> String {
        format!("{}/publication_info/{}/{}/{}", self.base, uid, lang, author_uid)
    }
}
