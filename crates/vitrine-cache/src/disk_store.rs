#![forbid(unsafe_code)]

//! Filesystem-backed [`CacheStorage`].
//!
//! Layout: one `<root>/<store>/<sha256(key)>.entry` file per entry. Its first line is the
//! JSON metadata (status, headers, request key), the rest is the payload. The whole file is
//! written via temp file + rename, so concurrent writers of one key leave exactly one
//! writer's entry.

use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use bytes::Bytes;
use vitrine_core::RequestKey;

use crate::{
    entry::{CacheEntry, EntryMeta},
    error::{CacheError, CacheResult},
    storage::{CacheStorage, validate_store_name},
};

const ENTRY_EXT: &str = "entry";

#[derive(Clone, Debug)]
pub struct DiskCacheStorage {
    root: Arc<PathBuf>,
}

impl DiskCacheStorage {
    /// Use `root` as the storage directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory cannot be created.
    pub fn open_root(root: impl Into<PathBuf>) -> CacheResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, store: &str) -> CacheResult<PathBuf> {
        validate_store_name(store)?;
        Ok(self.root.join(store))
    }

    async fn blocking<T, F>(&self, f: F) -> CacheResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> CacheResult<T> + Send + 'static,
    {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || f(&root))
            .await
            .map_err(|e| CacheError::Task(e.to_string()))?
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> CacheResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| CacheError::Io(std::io::Error::other("no parent dir")))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp")
        .tempfile_in(parent)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| CacheError::Io(e.error))?;
    Ok(())
}

fn encode_entry(entry: &CacheEntry) -> CacheResult<Vec<u8>> {
    let mut raw = serde_json::to_vec(&entry.meta())?;
    raw.reserve(entry.body.len() + 1);
    raw.push(b'\n');
    raw.extend_from_slice(&entry.body);
    Ok(raw)
}

fn read_entry(path: &Path) -> CacheResult<Option<CacheEntry>> {
    let raw = match std::fs::read(path) {
        Ok(raw) => Bytes::from(raw),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let Some(split) = raw.iter().position(|b| *b == b'\n') else {
        tracing::warn!(path = %path.display(), "entry without metadata line, ignoring");
        return Ok(None);
    };
    let meta: EntryMeta = serde_json::from_slice(&raw[..split])?;
    let body = raw.slice(split + 1..);
    if body.len() as u64 != meta.body_len {
        tracing::warn!(path = %path.display(), "body length mismatch, ignoring entry");
        return Ok(None);
    }
    Ok(Some(CacheEntry::from_meta(meta, body)))
}

fn entry_path(dir: &Path, key: &RequestKey) -> PathBuf {
    dir.join(format!("{}.{ENTRY_EXT}", key.digest_hex()))
}

fn remove_if_exists(path: &Path) -> CacheResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn store_names(&self) -> CacheResult<Vec<String>> {
        self.blocking(|root| {
            let mut names = Vec::new();
            for dirent in std::fs::read_dir(root)? {
                let dirent = dirent?;
                if !dirent.file_type()?.is_dir() {
                    continue;
                }
                if let Some(name) = dirent.file_name().to_str()
                    && validate_store_name(name).is_ok()
                {
                    names.push(name.to_string());
                }
            }
            names.sort();
            Ok(names)
        })
        .await
    }

    async fn open(&self, store: &str) -> CacheResult<()> {
        let dir = self.store_dir(store)?;
        tokio::fs::create_dir_all(dir).await?;
        Ok(())
    }

    async fn has_store(&self, store: &str) -> CacheResult<bool> {
        let dir = self.store_dir(store)?;
        Ok(tokio::fs::try_exists(dir).await?)
    }

    async fn delete_store(&self, store: &str) -> CacheResult<bool> {
        let dir = self.store_dir(store)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, store: &str, key: &RequestKey) -> CacheResult<Option<CacheEntry>> {
        let path = entry_path(&self.store_dir(store)?, key);
        self.blocking(move |_| read_entry(&path)).await
    }

    async fn put(&self, store: &str, entry: CacheEntry) -> CacheResult<()> {
        let dir = self.store_dir(store)?;
        self.blocking(move |_| {
            std::fs::create_dir_all(&dir)?;
            atomic_write(&entry_path(&dir, &entry.key), &encode_entry(&entry)?)
        })
        .await
    }

    async fn remove(&self, store: &str, key: &RequestKey) -> CacheResult<bool> {
        let path = entry_path(&self.store_dir(store)?, key);
        self.blocking(move |_| remove_if_exists(&path)).await
    }

    async fn entries(&self, store: &str) -> CacheResult<Vec<CacheEntry>> {
        let dir = self.store_dir(store)?;
        self.blocking(move |_| {
            let read = match std::fs::read_dir(&dir) {
                Ok(read) => read,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            };
            let mut entries = Vec::new();
            for dirent in read {
                let path = dirent?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXT) {
                    continue;
                }
                if let Some(entry) = read_entry(&path)? {
                    entries.push(entry);
                }
            }
            entries.sort_by(|a, b| a.stored_at.cmp(&b.stored_at).then(a.key.cmp(&b.key)));
            Ok(entries)
        })
        .await
    }
}
