//! Catalog configuration module.
//!
//! Handles loading, validating, and merging `scx.toml`. Stock defaults are
//! serialized to a TOML table, the user file is merged on top key by key,
//! and the result is deserialized and validated.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! environment = "prod"        # "dev" or "prod"; selects the cache lifetime
//! roots = ["sutta", "vinaya", "abhidhamma"]
//!
//! [api]
//! base_url = "https://suttacentral.net/api"
//! language = "en"             # Site language passed to menu/suttaplex
//!
//! [fetch]
//! max_concurrent = 50         # Requests in flight per fan-out wave
//! publication_info = true     # Fetch publication info per translation
//!
//! [cache]
//! enabled = true
//! dir = ".cache/scx"
//! duration = "*"              # Production lifetime ("*" = never expires)
//! dev_duration = "1d"         # Development lifetime
//!
//! [translations]
//! languages = ["en"]          # "*" keeps every language
//! include_root = true         # Keep root-language texts regardless
//!
//! [detail_branches]
//! suffixes = ["-pm"]          # Branch collections resolved like leaves
//! infixes = ["-pm-"]          # Branch sections resolved like leaves
//! ```
//!
//! ## Durations
//!
//! Cache lifetimes are `*` (never expire) or a whole number with a unit:
//! `30s`, `15m`, `12h`, `1d`, `2w`, `1y`. A zero duration always refetches.
//!
//! Unknown keys are rejected to catch typos early.

use crate::cache::CacheLifetime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build environment. Development builds use a shorter cache lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    #[default]
    Prod,
}

/// Catalog configuration loaded from `scx.toml`.
///
/// All fields have defaults matching the public SuttaCentral API. User
/// config files need only specify the values they want to override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub environment: Environment,
    /// Top-level collections, fetched concurrently.
    pub roots: Vec<String>,
    pub api: ApiConfig,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub translations: TranslationsConfig,
    pub detail_branches: DetailBranchesConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            roots: vec!["sutta".into(), "vinaya".into(), "abhidhamma".into()],
            api: ApiConfig::default(),
            fetch: FetchConfig::default(),
            cache: CacheConfig::default(),
            translations: TranslationsConfig::default(),
            detail_branches: DetailBranchesConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roots.is_empty() {
            return Err(ConfigError::Validation("roots must not be empty".into()));
        }
        if self.roots.iter().any(|r| r.trim().is_empty()) {
            return Err(ConfigError::Validation("roots must not contain blank uids".into()));
        }
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(
                "api.base_url must be an http(s) URL".into(),
            ));
        }
        if self.fetch.max_concurrent == 0 {
            return Err(ConfigError::Validation(
                "fetch.max_concurrent must be at least 1".into(),
            ));
        }
        if self.translations.languages.is_empty() {
            return Err(ConfigError::Validation(
                "translations.languages must not be empty (use \"*\" for all)".into(),
            ));
        }
        parse_duration(&self.cache.duration)?;
        parse_duration(&self.cache.dev_duration)?;
        Ok(())
    }

    /// Cache lifetime for the configured environment, `None` when disabled.
    pub fn cache_lifetime(&self) -> Result<Option<CacheLifetime>, ConfigError> {
        if !self.cache.enabled {
            return Ok(None);
        }
        let raw = match self.environment {
            Environment::Dev => &self.cache.dev_duration,
            Environment::Prod => &self.cache.duration,
        };
        parse_duration(raw).map(Some)
    }
}

/// Upstream API location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    /// Site language for menu and suttaplex lookups.
    pub language: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://suttacentral.net/api".into(),
            language: "en".into(),
        }
    }
}

/// Fetch behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Maximum requests in flight within one fan-out wave.
    pub max_concurrent: usize,
    /// Whether to fetch publication info for each translation.
    pub publication_info: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 50,
            publication_info: true,
        }
    }
}

/// On-disk response cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    /// Production lifetime.
    pub duration: String,
    /// Development lifetime.
    pub dev_duration: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(".cache/scx"),
            duration: "*".into(),
            dev_duration: "1d".into(),
        }
    }
}

/// Which translations are kept on leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslationsConfig {
    /// Language codes to keep; `"*"` keeps every language.
    pub languages: Vec<String>,
    /// Keep root-language texts regardless of `languages`.
    pub include_root: bool,
}

impl Default for TranslationsConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".into()],
            include_root: true,
        }
    }
}

/// Naming rules for branches that also carry leaf detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetailBranchesConfig {
    /// Uid suffixes marking a detail-bearing collection (a chapter boundary).
    pub suffixes: Vec<String>,
    /// Uid infixes marking a detail-bearing section.
    pub infixes: Vec<String>,
}

impl Default for DetailBranchesConfig {
    fn default() -> Self {
        Self {
            suffixes: vec!["-pm".into()],
            infixes: vec!["-pm-".into()],
        }
    }
}

/// Parse a cache lifetime: `*` or `<n><unit>` with unit `s|m|h|d|w|y`.
pub fn parse_duration(raw: &str) -> Result<CacheLifetime, ConfigError> {
    let raw = raw.trim();
    if raw == "*" {
        return Ok(CacheLifetime::Forever);
    }
    let invalid = || {
        ConfigError::Validation(format!(
            "invalid cache duration {raw:?} (expected \"*\" or e.g. \"30m\", \"1d\")"
        ))
    };
    let split = raw.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
    let (digits, unit) = raw.split_at(split);
    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    let seconds_per_unit = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        "y" => 365 * 24 * 60 * 60,
        _ => return Err(invalid()),
    };
    let seconds = amount.checked_mul(seconds_per_unit).ok_or_else(invalid)?;
    Ok(CacheLifetime::For(Duration::from_secs(seconds)))
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(CatalogConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<CatalogConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CatalogConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given `scx.toml` path, falling back to defaults
/// when the file is absent.
pub fn load_config(path: &Path) -> Result<CatalogConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `scx.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# scx-catalog configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# "dev" or "prod". Selects which cache lifetime applies.
environment = "prod"

# Top-level collections to aggregate. Each is fetched concurrently.
roots = ["sutta", "vinaya", "abhidhamma"]

# ---------------------------------------------------------------------------
# Upstream API
# ---------------------------------------------------------------------------
[api]
base_url = "https://suttacentral.net/api"
# Site language passed to menu and suttaplex lookups.
language = "en"

# ---------------------------------------------------------------------------
# Fetching
# ---------------------------------------------------------------------------
[fetch]
# Requests in flight per fan-out wave (children of a branch, translations
# of a leaf).
max_concurrent = 50
# Fetch publication info for every kept translation. Many texts have none;
# those misses are counted but not treated as failures.
publication_info = true

# ---------------------------------------------------------------------------
# Response cache
# ---------------------------------------------------------------------------
# Lifetimes are "*" (never expire) or a number with a unit:
# s, m, h, d, w, y. "0s" always refetches.
[cache]
enabled = true
dir = ".cache/scx"
duration = "*"
dev_duration = "1d"

# ---------------------------------------------------------------------------
# Translation filter
# ---------------------------------------------------------------------------
[translations]
# Language codes to keep. Use ["*"] to keep every language.
languages = ["en"]
# Keep root-language texts (Pali, Sanskrit, ...) regardless of languages.
include_root = true

# ---------------------------------------------------------------------------
# Detail-bearing branches
# ---------------------------------------------------------------------------
# Some branches (the patimokkha collections) have their own suttaplex
# record. Branches whose uid ends with a suffix are resolved like leaves
# and also end the chapter view; branches whose uid contains an infix are
# only resolved like leaves.
[detail_branches]
suffixes = ["-pm"]
infixes = ["-pm-"]
"##
}
