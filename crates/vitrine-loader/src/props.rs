use url::Url;
use vitrine_core::{ClientCapabilities, MediaAsset, MediaKind, VariantKind};

/// How a low-fidelity thumbnail is used while the final asset loads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PreviewMode {
    #[default]
    Off,
    /// Show the thumbnail and observe with a wider margin.
    Progressive,
    /// Show the thumbnail and start loading at mount.
    Immediate,
}

impl PreviewMode {
    pub fn is_on(self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// Per-element inputs from the host document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderProps {
    pub src: Url,
    pub thumbnail_src: Option<Url>,
    pub modern_src: Option<Url>,
    pub thumbnail_modern_src: Option<Url>,
    /// Most LCP-critical element of the page: loads at mount and is hinted at high priority.
    pub priority: bool,
    /// Load at mount without observation.
    pub eager: bool,
    pub preview: PreviewMode,
    pub kind: MediaKind,
}

impl LoaderProps {
    pub fn new(src: Url, kind: MediaKind) -> Self {
        Self {
            src,
            thumbnail_src: None,
            modern_src: None,
            thumbnail_modern_src: None,
            priority: false,
            eager: false,
            preview: PreviewMode::Off,
            kind,
        }
    }

    /// Props for `asset`: the baseline variant (or the source) as `src`, the rest as present.
    pub fn from_asset(asset: &MediaAsset) -> Self {
        let variants = asset.variants();
        Self {
            src: asset.resolve(VariantKind::Baseline).clone(),
            thumbnail_src: variants.thumbnail_baseline.clone(),
            modern_src: variants.modern.clone(),
            thumbnail_modern_src: variants.thumbnail_modern.clone(),
            ..Self::new(asset.source().clone(), asset.kind())
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_eager(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    #[must_use]
    pub fn with_preview(mut self, preview: PreviewMode) -> Self {
        self.preview = preview;
        self
    }

    /// Whether mount goes straight to `Loading`.
    pub fn starts_immediately(&self) -> bool {
        self.priority || self.eager || self.preview == PreviewMode::Immediate
    }

    /// The modern variant when the client decodes it, else `src`.
    pub fn final_url(&self, caps: ClientCapabilities) -> &Url {
        match &self.modern_src {
            Some(modern) if caps.modern_image => modern,
            _ => &self.src,
        }
    }

    /// Thumbnail shown under the final asset, if previews are on and one exists.
    pub fn preview_url(&self, caps: ClientCapabilities) -> Option<&Url> {
        if !self.preview.is_on() {
            return None;
        }
        match (&self.thumbnail_modern_src, &self.thumbnail_src) {
            (Some(modern), _) if caps.modern_image => Some(modern),
            (_, Some(baseline)) => Some(baseline),
            _ => None,
        }
    }
}
