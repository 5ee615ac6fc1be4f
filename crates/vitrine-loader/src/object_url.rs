use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use bytes::Bytes;
use parking_lot::Mutex;
use url::Url;

use crate::error::{LoadError, LoadResult};

/// Issues page-local URLs for in-memory blobs (locally selected, not-yet-uploaded files).
///
/// Every created URL pins its bytes until revoked.
pub trait ObjectUrlRegistry: Send + Sync {
    /// # Errors
    ///
    /// [`LoadError::ObjectUrl`] if no URL could be minted.
    fn create(&self, bytes: Bytes, content_type: &str) -> LoadResult<Url>;

    fn revoke(&self, url: &Url);
}

impl<R: ObjectUrlRegistry + ?Sized> ObjectUrlRegistry for Arc<R> {
    fn create(&self, bytes: Bytes, content_type: &str) -> LoadResult<Url> {
        (**self).create(bytes, content_type)
    }

    fn revoke(&self, url: &Url) {
        (**self).revoke(url);
    }
}

/// In-process registry handing out `blob:vitrine/<n>` URLs.
#[derive(Debug, Default)]
pub struct MemoryObjectUrls {
    next: AtomicU64,
    live: Mutex<HashMap<Url, (Bytes, String)>>,
}

impl MemoryObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes and content type behind a live URL.
    pub fn resolve(&self, url: &Url) -> Option<(Bytes, String)> {
        self.live.lock().get(url).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    pub fn live_bytes(&self) -> usize {
        self.live.lock().values().map(|(b, _)| b.len()).sum()
    }
}

impl ObjectUrlRegistry for MemoryObjectUrls {
    fn create(&self, bytes: Bytes, content_type: &str) -> LoadResult<Url> {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let url = Url::parse(&format!("blob:vitrine/{n}"))
            .map_err(|e| LoadError::ObjectUrl(e.to_string()))?;
        self.live
            .lock()
            .insert(url.clone(), (bytes, content_type.to_string()));
        Ok(url)
    }

    fn revoke(&self, url: &Url) {
        if self.live.lock().remove(url).is_none() {
            tracing::debug!(%url, "revoke of unknown object URL");
        }
    }
}

/// An object URL revoked when dropped.
pub struct ObjectUrl {
    url: Url,
    registry: Arc<dyn ObjectUrlRegistry>,
}

impl ObjectUrl {
    /// # Errors
    ///
    /// Whatever the registry returns from [`ObjectUrlRegistry::create`].
    pub fn create(
        registry: Arc<dyn ObjectUrlRegistry>,
        bytes: Bytes,
        content_type: &str,
    ) -> LoadResult<Self> {
        let url = registry.create(bytes, content_type)?;
        Ok(Self { url, registry })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}

impl std::fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.url.as_str()).finish()
    }
}

/// Preview of the file currently selected in an upload form.
///
/// Selecting another file revokes the previous URL; dropping the preview revokes the last.
pub struct LocalPreview {
    registry: Arc<dyn ObjectUrlRegistry>,
    current: Option<ObjectUrl>,
}

impl LocalPreview {
    pub fn new(registry: Arc<dyn ObjectUrlRegistry>) -> Self {
        Self {
            registry,
            current: None,
        }
    }

    /// Replace the preview with `bytes`.
    ///
    /// # Errors
    ///
    /// Registry failure; the previous preview is kept in that case.
    pub fn select(&mut self, bytes: Bytes, content_type: &str) -> LoadResult<&Url> {
        let next = ObjectUrl::create(Arc::clone(&self.registry), bytes, content_type)?;
        let current = self.current.insert(next);
        Ok(current.url())
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn url(&self) -> Option<&Url> {
        self.current.as_ref().map(ObjectUrl::url)
    }
}
