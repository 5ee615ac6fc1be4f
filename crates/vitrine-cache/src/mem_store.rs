#![forbid(unsafe_code)]

//! In-memory [`CacheStorage`].

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use dashmap::DashMap;
use vitrine_core::RequestKey;

use crate::{
    entry::CacheEntry,
    error::CacheResult,
    storage::{CacheStorage, validate_store_name},
};

type Store = HashMap<RequestKey, CacheEntry>;

/// Stores live in a `DashMap` keyed by name; nothing is persisted.
#[derive(Clone, Debug, Default)]
pub struct MemCacheStorage {
    stores: Arc<DashMap<String, Store>>,
}

impl MemCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemCacheStorage {
    async fn store_names(&self) -> CacheResult<Vec<String>> {
        let mut names: Vec<String> = self.stores.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn open(&self, store: &str) -> CacheResult<()> {
        validate_store_name(store)?;
        self.stores.entry(store.to_string()).or_default();
        Ok(())
    }

    async fn has_store(&self, store: &str) -> CacheResult<bool> {
        Ok(self.stores.contains_key(store))
    }

    async fn delete_store(&self, store: &str) -> CacheResult<bool> {
        Ok(self.stores.remove(store).is_some())
    }

    async fn get(&self, store: &str, key: &RequestKey) -> CacheResult<Option<CacheEntry>> {
        Ok(self
            .stores
            .get(store)
            .and_then(|s| s.get(key).cloned()))
    }

    async fn put(&self, store: &str, entry: CacheEntry) -> CacheResult<()> {
        validate_store_name(store)?;
        self.stores
            .entry(store.to_string())
            .or_default()
            .insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn remove(&self, store: &str, key: &RequestKey) -> CacheResult<bool> {
        Ok(self
            .stores
            .get_mut(store)
            .is_some_and(|mut s| s.remove(key).is_some()))
    }

    async fn entries(&self, store: &str) -> CacheResult<Vec<CacheEntry>> {
        let mut entries: Vec<CacheEntry> = self
            .stores
            .get(store)
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| a.stored_at.cmp(&b.stored_at).then(a.key.cmp(&b.key)));
        Ok(entries)
    }
}
