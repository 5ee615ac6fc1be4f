use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;
use vitrine_core::MediaKind;
use vitrine_net::{Destination, Net};

use crate::error::{LoadError, LoadResult};

/// A final asset that arrived and, for images, decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedMedia {
    pub url: Url,
    pub bytes: Bytes,
    /// Decoded pixel size; `None` for video.
    pub dimensions: Option<(u32, u32)>,
}

#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// # Errors
    ///
    /// [`LoadError`] on network failure, a non-2xx status or an undecodable image.
    async fn fetch_media(&self, url: &Url, kind: MediaKind) -> LoadResult<FetchedMedia>;
}

#[async_trait]
impl<F: MediaFetcher + ?Sized> MediaFetcher for Arc<F> {
    async fn fetch_media(&self, url: &Url, kind: MediaKind) -> LoadResult<FetchedMedia> {
        (**self).fetch_media(url, kind).await
    }
}

/// [`MediaFetcher`] over any [`Net`]; images are fully decoded on the blocking pool
/// before they count as loaded.
#[derive(Clone, Debug)]
pub struct NetMediaFetcher<N> {
    net: N,
}

impl<N: Net> NetMediaFetcher<N> {
    pub fn new(net: N) -> Self {
        Self { net }
    }

    pub fn net(&self) -> &N {
        &self.net
    }
}

async fn decode_dimensions(bytes: Bytes) -> LoadResult<(u32, u32)> {
    tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes)
            .map(|img| (img.width(), img.height()))
            .map_err(|e| LoadError::Decode(e.to_string()))
    })
    .await
    .map_err(|e| LoadError::Task(e.to_string()))?
}

#[async_trait]
impl<N: Net> MediaFetcher for NetMediaFetcher<N> {
    async fn fetch_media(&self, url: &Url, kind: MediaKind) -> LoadResult<FetchedMedia> {
        let destination = match kind {
            MediaKind::Image => Destination::Image,
            MediaKind::Video => Destination::Video,
        };
        let bytes = self.net.get_bytes(url.clone(), destination).await?;
        if bytes.is_empty() {
            return Err(LoadError::Empty);
        }

        let dimensions = match kind {
            MediaKind::Image => Some(decode_dimensions(bytes.clone()).await?),
            MediaKind::Video => None,
        };

        Ok(FetchedMedia {
            url: url.clone(),
            bytes,
            dimensions,
        })
    }
}
