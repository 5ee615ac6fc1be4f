use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TranscodeError, TranscodeResult};

/// Transcoding knobs. Deserializes from partial JSON; absent fields take defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// Full-size encode quality in `(0, 1]`.
    pub quality: f32,
    /// Edge of the square box thumbnails are fitted into.
    pub thumbnail_size: u32,
    pub thumbnail_quality: f32,
    /// Decoder allocation ceiling in bytes.
    pub max_decode_bytes: u64,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            quality: 0.85,
            thumbnail_size: 400,
            thumbnail_quality: 0.8,
            max_decode_bytes: 512 * 1024 * 1024,
        }
    }
}

impl TranscodeOptions {
    /// # Errors
    ///
    /// [`TranscodeError::InvalidOptions`] for zero bounds or qualities outside `(0, 1]`.
    pub fn validate(&self) -> TranscodeResult<()> {
        if self.max_width == 0 || self.max_height == 0 || self.thumbnail_size == 0 {
            return Err(TranscodeError::InvalidOptions(
                "size bounds must be positive".to_string(),
            ));
        }
        for (name, q) in [
            ("quality", self.quality),
            ("thumbnail_quality", self.thumbnail_quality),
        ] {
            if !(q > 0.0 && q <= 1.0) {
                return Err(TranscodeError::InvalidOptions(format!(
                    "{name} must be in (0, 1], got {q}"
                )));
            }
        }
        Ok(())
    }
}

/// Scale `width`×`height` down into a `max_width`×`max_height` box.
///
/// Aspect ratio is preserved, images are never upscaled and neither side drops below 1.
/// Width is clamped first, then height, so the result always fits the box.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width.max(1), height.max(1));
    }
    let aspect = f64::from(width) / f64::from(height);
    let mut w = f64::from(width);
    let mut h = f64::from(height);

    if w > f64::from(max_width) {
        w = f64::from(max_width);
        h = w / aspect;
    }
    if h > f64::from(max_height) {
        h = f64::from(max_height);
        w = h * aspect;
    }

    let round = |v: f64, bound: u32| (v.round() as u32).clamp(1, bound.max(1));
    (round(w, max_width), round(h, max_height))
}

/// Encoded output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Universally decodable baseline.
    Jpeg,
    /// Smaller modern format (lossy WebP).
    WebP,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::WebP => "webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
