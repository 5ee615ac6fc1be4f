use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{CoreError, CoreResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

impl MediaKind {
    /// Classify an upload by its MIME type. Only `image/*` and `video/*` are accepted.
    pub fn from_mime(mime: &str) -> CoreResult<Self> {
        let top = mime
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match top.as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            _ => Err(CoreError::UnsupportedMediaType(mime.to_string())),
        }
    }
}

/// One size/format slot of a [`VariantSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Baseline,
    Modern,
    ThumbnailBaseline,
    ThumbnailModern,
}

impl VariantKind {
    pub const ALL: [VariantKind; 4] = [
        VariantKind::Baseline,
        VariantKind::Modern,
        VariantKind::ThumbnailBaseline,
        VariantKind::ThumbnailModern,
    ];

    pub fn is_thumbnail(self) -> bool {
        matches!(self, Self::ThumbnailBaseline | Self::ThumbnailModern)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSet {
    pub baseline: Option<Url>,
    pub modern: Option<Url>,
    pub thumbnail_baseline: Option<Url>,
    pub thumbnail_modern: Option<Url>,
}

impl VariantSet {
    pub fn get(&self, kind: VariantKind) -> Option<&Url> {
        match kind {
            VariantKind::Baseline => self.baseline.as_ref(),
            VariantKind::Modern => self.modern.as_ref(),
            VariantKind::ThumbnailBaseline => self.thumbnail_baseline.as_ref(),
            VariantKind::ThumbnailModern => self.thumbnail_modern.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        VariantKind::ALL.iter().all(|k| self.get(*k).is_none())
    }
}

/// A media item as seen by the delivery pipeline.
///
/// Immutable once built: a changed source means a new asset, never an edited one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    source: Url,
    kind: MediaKind,
    variants: VariantSet,
}

impl MediaAsset {
    pub fn new(source: Url, kind: MediaKind) -> Self {
        Self {
            source,
            kind,
            variants: VariantSet::default(),
        }
    }

    #[must_use]
    pub fn with_variants(mut self, variants: VariantSet) -> Self {
        self.variants = variants;
        self
    }

    pub fn source(&self) -> &Url {
        &self.source
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn variants(&self) -> &VariantSet {
        &self.variants
    }

    /// URL for `kind`, falling back to the source when the variant is absent.
    pub fn resolve(&self, kind: VariantKind) -> &Url {
        self.variants.get(kind).unwrap_or(&self.source)
    }

    /// Whether a dedicated thumbnail exists in any format.
    pub fn has_thumbnail(&self) -> bool {
        self.variants.thumbnail_baseline.is_some() || self.variants.thumbnail_modern.is_some()
    }
}
