#![forbid(unsafe_code)]

use crate::{error::CacheResult, storage::CacheStorage};

/// Drop the oldest entries of `store` until at most `max` remain.
///
/// Returns the number of entries removed. Ordering uses `stored_at`, so a replaced
/// entry counts as fresh.
pub(crate) async fn trim_store<S: CacheStorage + ?Sized>(
    storage: &S,
    store: &str,
    max: usize,
) -> CacheResult<usize> {
    let entries = storage.entries(store).await?;
    let excess = entries.len().saturating_sub(max);
    let mut removed = 0;
    for entry in entries.iter().take(excess) {
        if storage.remove(store, &entry.key).await? {
            removed += 1;
        }
    }
    if removed > 0 {
        tracing::debug!(store, removed, max, "evicted oldest entries");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use bytes::Bytes;
    use url::Url;
    use vitrine_core::RequestKey;
    use vitrine_net::Response;

    use super::*;
    use crate::{entry::CacheEntry, mem_store::MemCacheStorage};

    fn entry(path: &str, age_secs: u64) -> CacheEntry {
        let url = Url::parse(&format!("https://app.test{path}")).unwrap();
        let mut entry = CacheEntry::from_response(
            RequestKey::from_url(&url).unwrap(),
            &Response::ok(url, Bytes::new()),
        );
        entry.stored_at = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000 - age_secs);
        entry
    }

    #[tokio::test]
    async fn removes_oldest_first() {
        let storage = MemCacheStorage::new();
        storage.put("dynamic-v1", entry("/old", 30)).await.unwrap();
        storage.put("dynamic-v1", entry("/mid", 20)).await.unwrap();
        storage.put("dynamic-v1", entry("/new", 10)).await.unwrap();

        assert_eq!(trim_store(&storage, "dynamic-v1", 2).await.unwrap(), 1);

        let left: Vec<String> = storage
            .entries("dynamic-v1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.url.path().to_string())
            .collect();
        assert_eq!(left, vec!["/mid", "/new"]);
    }

    #[tokio::test]
    async fn under_limit_is_untouched() {
        let storage = MemCacheStorage::new();
        storage.put("dynamic-v1", entry("/a", 1)).await.unwrap();
        assert_eq!(trim_store(&storage, "dynamic-v1", 5).await.unwrap(), 0);
        assert_eq!(trim_store(&storage, "missing", 0).await.unwrap(), 0);
    }
}
