#![forbid(unsafe_code)]

use async_trait::async_trait;
use vitrine_core::RequestKey;

use crate::{
    entry::CacheEntry,
    error::{CacheError, CacheResult},
};

/// Named stores of request/response pairs.
///
/// Store names are flat identifiers such as `static-v2`. Opening a store that does not
/// exist creates it; deleting one removes every entry it holds.
#[async_trait]
pub trait CacheStorage: Send + Sync + 'static {
    /// Names of every existing store.
    async fn store_names(&self) -> CacheResult<Vec<String>>;

    /// Create `store` if missing.
    async fn open(&self, store: &str) -> CacheResult<()>;

    async fn has_store(&self, store: &str) -> CacheResult<bool>;

    /// Returns `true` if the store existed.
    async fn delete_store(&self, store: &str) -> CacheResult<bool>;

    async fn get(&self, store: &str, key: &RequestKey) -> CacheResult<Option<CacheEntry>>;

    /// Insert or replace the entry for `entry.key`. Creates the store if missing.
    async fn put(&self, store: &str, entry: CacheEntry) -> CacheResult<()>;

    async fn remove(&self, store: &str, key: &RequestKey) -> CacheResult<bool>;

    /// Entries of `store`, oldest first.
    async fn entries(&self, store: &str) -> CacheResult<Vec<CacheEntry>>;
}

#[async_trait]
impl<S: CacheStorage + ?Sized> CacheStorage for std::sync::Arc<S> {
    async fn store_names(&self) -> CacheResult<Vec<String>> {
        (**self).store_names().await
    }

    async fn open(&self, store: &str) -> CacheResult<()> {
        (**self).open(store).await
    }

    async fn has_store(&self, store: &str) -> CacheResult<bool> {
        (**self).has_store(store).await
    }

    async fn delete_store(&self, store: &str) -> CacheResult<bool> {
        (**self).delete_store(store).await
    }

    async fn get(&self, store: &str, key: &RequestKey) -> CacheResult<Option<CacheEntry>> {
        (**self).get(store, key).await
    }

    async fn put(&self, store: &str, entry: CacheEntry) -> CacheResult<()> {
        (**self).put(store, entry).await
    }

    async fn remove(&self, store: &str, key: &RequestKey) -> CacheResult<bool> {
        (**self).remove(store, key).await
    }

    async fn entries(&self, store: &str) -> CacheResult<Vec<CacheEntry>> {
        (**self).entries(store).await
    }
}

/// Reject names that could escape a storage root or collide with temp files.
pub(crate) fn validate_store_name(store: &str) -> CacheResult<()> {
    let ok = !store.is_empty()
        && store.len() <= 128
        && !store.starts_with('.')
        && store
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(CacheError::InvalidStoreName(store.to_string()))
    }
}
