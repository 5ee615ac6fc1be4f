#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CacheError, CacheResult};

/// Deployment-time description of what to precache and how to name stores.
///
/// Loaded from JSON; every field has a default so a manifest may set only `version`
/// and `origin`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheManifest {
    /// Bumped on every deploy; stores of other versions are deleted on activation.
    pub version: String,
    /// Origin the controller serves. Relative precache entries resolve against it.
    pub origin: Url,
    /// Paths or absolute URLs primed during install.
    pub precache: Vec<String>,
    /// Returned for failed document navigations with no stored entry.
    pub offline_root: String,
    /// Cross-origin hosts treated as static and intercepted.
    pub font_origins: Vec<String>,
    /// Path extensions (no dot, lowercase) that mark a same-origin request as static.
    pub static_extensions: Vec<String>,
    /// Bound on the dynamic store; oldest entries are evicted past it.
    pub max_dynamic_entries: Option<usize>,
    pub static_prefix: String,
    pub dynamic_prefix: String,
}

impl Default for CacheManifest {
    fn default() -> Self {
        #[allow(clippy::unwrap_used, reason = "literal URL")]
        let origin = Url::parse("http://localhost/").unwrap();
        Self {
            version: "v2".to_string(),
            origin,
            precache: vec![
                "/".to_string(),
                "/main.js".to_string(),
                "/app.js".to_string(),
                "/index.css".to_string(),
                "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600&display=swap"
                    .to_string(),
            ],
            offline_root: "/".to_string(),
            font_origins: vec![
                "fonts.googleapis.com".to_string(),
                "fonts.gstatic.com".to_string(),
            ],
            static_extensions: ["css", "js", "mjs", "woff", "woff2", "ttf", "otf"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_dynamic_entries: None,
            static_prefix: "static".to_string(),
            dynamic_prefix: "dynamic".to_string(),
        }
    }
}

impl CacheManifest {
    /// # Errors
    ///
    /// [`CacheError::Json`] on malformed input.
    pub fn from_json(raw: &str) -> CacheResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn with_precache<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.precache = entries.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_max_dynamic_entries(mut self, max: usize) -> Self {
        self.max_dynamic_entries = Some(max);
        self
    }

    pub fn store_names(&self) -> StoreNames {
        StoreNames {
            static_store: format!("{}-{}", self.static_prefix, self.version),
            dynamic_store: format!("{}-{}", self.dynamic_prefix, self.version),
        }
    }

    /// Precache entries resolved to absolute URLs.
    ///
    /// # Errors
    ///
    /// [`CacheError::Install`] naming the first entry that does not resolve.
    pub fn precache_urls(&self) -> CacheResult<Vec<Url>> {
        self.precache
            .iter()
            .map(|entry| {
                self.origin.join(entry).map_err(|e| CacheError::Install {
                    version: self.version.clone(),
                    reason: format!("bad precache entry {entry:?}: {e}"),
                })
            })
            .collect()
    }

    /// # Errors
    ///
    /// [`CacheError::InvalidKey`] if the configured root does not resolve.
    pub fn offline_root_url(&self) -> CacheResult<Url> {
        self.origin
            .join(&self.offline_root)
            .map_err(|e| vitrine_core::CoreError::InvalidUrl(e.to_string()).into())
    }
}

/// The two store names owned by one manifest version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreNames {
    pub static_store: String,
    pub dynamic_store: String,
}

impl StoreNames {
    pub fn contains(&self, name: &str) -> bool {
        name == self.static_store || name == self.dynamic_store
    }

    /// Static store first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> {
        [self.static_store.as_str(), self.dynamic_store.as_str()].into_iter()
    }
}
