use std::time::SystemTime;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;
use vitrine_core::RequestKey;
use vitrine_net::{Headers, Response};

/// A stored request/response pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: RequestKey,
    pub url: Url,
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
    pub stored_at: SystemTime,
}

impl CacheEntry {
    pub fn from_response(key: RequestKey, response: &Response) -> Self {
        Self {
            key,
            url: response.url.clone(),
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            stored_at: SystemTime::now(),
        }
    }

    pub fn to_response(&self) -> Response {
        Response {
            url: self.url.clone(),
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    pub(crate) fn meta(&self) -> EntryMeta {
        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        headers.sort();
        EntryMeta {
            key: self.key.clone(),
            url: self.url.clone(),
            status: self.status,
            headers,
            stored_at: self.stored_at,
            body_len: self.body.len() as u64,
        }
    }

    pub(crate) fn from_meta(meta: EntryMeta, body: Bytes) -> Self {
        Self {
            key: meta.key,
            url: meta.url,
            status: meta.status,
            headers: meta.headers.into_iter().collect(),
            body,
            stored_at: meta.stored_at,
        }
    }
}

/// Metadata line heading an on-disk entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct EntryMeta {
    pub key: RequestKey,
    pub url: Url,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub stored_at: SystemTime,
    pub body_len: u64,
}
