#![forbid(unsafe_code)]

//! Uploading transcoded variants to an object store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use url::Url;
use vitrine_core::{MediaAsset, MediaKind, VariantKind, VariantSet};
use vitrine_net::{Method, Net, Request};

use crate::{error::PublishError, transcoder::TranscodedVariants};

/// Blob storage that hands back a public URL per object.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `name` and return the URL it is served from.
    async fn put(&self, name: &str, bytes: Bytes, content_type: &str) -> Result<Url, PublishError>;
}

/// Object name for one variant: `<base>.jpg`, `<base>_thumb.webp`, ...
pub fn variant_object_name(base: &str, kind: VariantKind, extension: &str) -> String {
    let suffix = if kind.is_thumbnail() { "_thumb" } else { "" };
    format!("{base}{suffix}.{extension}")
}

/// Upload all four variants under a fresh random base name.
///
/// # Errors
///
/// The first [`PublishError`] from the store, unchanged. There are no retries.
pub async fn publish(
    variants: &TranscodedVariants,
    store: &dyn ObjectStore,
) -> Result<MediaAsset, PublishError> {
    let base = uuid::Uuid::new_v4().simple().to_string();
    publish_as(variants, store, &base).await
}

/// [`publish`] with an explicit base name.
///
/// # Errors
///
/// See [`publish`].
pub async fn publish_as(
    variants: &TranscodedVariants,
    store: &dyn ObjectStore,
    base: &str,
) -> Result<MediaAsset, PublishError> {
    let uploads = variants.iter().map(|(kind, variant)| async move {
        let name = variant_object_name(base, kind, variant.format.extension());
        let url = store
            .put(&name, variant.bytes.clone(), variant.format.content_type())
            .await?;
        tracing::debug!(%name, %url, bytes = variant.bytes.len(), "variant uploaded");
        Ok::<_, PublishError>((kind, url))
    });
    let uploaded = futures::future::try_join_all(uploads).await?;

    let mut set = VariantSet::default();
    for (kind, url) in uploaded {
        match kind {
            VariantKind::Baseline => set.baseline = Some(url),
            VariantKind::Modern => set.modern = Some(url),
            VariantKind::ThumbnailBaseline => set.thumbnail_baseline = Some(url),
            VariantKind::ThumbnailModern => set.thumbnail_modern = Some(url),
        }
    }
    let source = set
        .baseline
        .clone()
        .ok_or_else(|| PublishError::Rejected {
            name: base.to_string(),
            reason: "baseline variant missing".to_string(),
        })?;
    Ok(MediaAsset::new(source, MediaKind::Image).with_variants(set))
}

/// In-memory store serving objects under `base_url`.
#[derive(Clone, Debug)]
pub struct MemObjectStore {
    base_url: Url,
    objects: Arc<DashMap<String, (Bytes, String)>>,
}

impl MemObjectStore {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            objects: Arc::new(DashMap::new()),
        }
    }

    /// Stored bytes and content type for `name`.
    pub fn object(&self, name: &str) -> Option<(Bytes, String)> {
        self.objects.get(name).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemObjectStore {
    async fn put(&self, name: &str, bytes: Bytes, content_type: &str) -> Result<Url, PublishError> {
        let url = self.base_url.join(name).map_err(|e| PublishError::Rejected {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.objects
            .insert(name.to_string(), (bytes, content_type.to_string()));
        Ok(url)
    }
}

/// Uploads with `PUT <bucket>/<name>` through a [`Net`].
pub struct HttpObjectStore<N> {
    net: N,
    bucket: Url,
    bearer: Option<String>,
}

impl<N: Net> HttpObjectStore<N> {
    /// `bucket` should end with `/` so names resolve beneath it.
    pub fn new(net: N, bucket: Url) -> Self {
        Self {
            net,
            bucket,
            bearer: None,
        }
    }

    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

#[async_trait]
impl<N: Net> ObjectStore for HttpObjectStore<N> {
    async fn put(&self, name: &str, bytes: Bytes, content_type: &str) -> Result<Url, PublishError> {
        let url = self.bucket.join(name).map_err(|e| PublishError::Rejected {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        let mut request = Request::new(Method::Put, url.clone())
            .with_header("content-type", content_type)
            .with_body(bytes);
        if let Some(token) = &self.bearer {
            request = request.with_header("authorization", format!("Bearer {token}"));
        }

        let response = self.net.fetch(request).await?;
        if !response.is_success() {
            return Err(PublishError::Rejected {
                name: name.to_string(),
                reason: format!("HTTP {}", response.status),
            });
        }
        Ok(url)
    }
}
