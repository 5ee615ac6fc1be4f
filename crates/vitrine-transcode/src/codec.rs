#![forbid(unsafe_code)]

//! Pixel codec seam.

use std::{
    io::Cursor,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use bytes::Bytes;
use image::{
    DynamicImage, ImageError, ImageReader, Limits, codecs::jpeg::JpegEncoder,
    error::LimitErrorKind, imageops::FilterType,
};

use crate::{
    error::{DecodeError, TranscodeError, TranscodeResult},
    options::OutputFormat,
};

/// Counts decoded pixel buffers that are still alive.
///
/// Cloned handles share the same counters.
#[derive(Clone, Debug, Default)]
pub struct BufferTracker {
    live: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl BufferTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    fn acquire(&self) {
        let now = self.live.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
    }

    fn release(&self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A decoded or resized pixel surface.
#[derive(Debug)]
pub struct DecodedImage {
    pixels: DynamicImage,
    tracker: Option<BufferTracker>,
}

impl DecodedImage {
    pub fn new(pixels: DynamicImage) -> Self {
        Self {
            pixels,
            tracker: None,
        }
    }

    /// Wrap `pixels`, counting it as live in `tracker` until dropped.
    pub fn tracked(pixels: DynamicImage, tracker: &BufferTracker) -> Self {
        tracker.acquire();
        Self {
            pixels,
            tracker: Some(tracker.clone()),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    fn derive(&self, pixels: DynamicImage) -> Self {
        match &self.tracker {
            Some(tracker) => Self::tracked(pixels, tracker),
            None => Self::new(pixels),
        }
    }
}

impl Drop for DecodedImage {
    fn drop(&mut self) {
        if let Some(tracker) = &self.tracker {
            tracker.release();
        }
    }
}

/// Decode, resize and encode primitives. All calls are blocking and CPU-bound.
pub trait ImageCodec: Send + Sync + 'static {
    /// # Errors
    ///
    /// [`TranscodeError::Decode`] for unreadable input, [`TranscodeError::ResourceExhausted`]
    /// when the decoder would exceed `max_bytes`.
    fn decode(&self, source: &[u8], max_bytes: u64) -> TranscodeResult<DecodedImage>;

    /// # Errors
    ///
    /// [`TranscodeError::Resize`] if the target cannot be produced.
    fn resize(
        &self,
        image: &DecodedImage,
        width: u32,
        height: u32,
    ) -> TranscodeResult<DecodedImage>;

    /// Encode at `quality` in `(0, 1]`.
    ///
    /// # Errors
    ///
    /// [`TranscodeError::Encode`] on encoder failure.
    fn encode(
        &self,
        image: &DecodedImage,
        format: OutputFormat,
        quality: f32,
    ) -> TranscodeResult<Bytes>;
}

impl<C: ImageCodec + ?Sized> ImageCodec for Arc<C> {
    fn decode(&self, source: &[u8], max_bytes: u64) -> TranscodeResult<DecodedImage> {
        (**self).decode(source, max_bytes)
    }

    fn resize(
        &self,
        image: &DecodedImage,
        width: u32,
        height: u32,
    ) -> TranscodeResult<DecodedImage> {
        (**self).resize(image, width, height)
    }

    fn encode(
        &self,
        image: &DecodedImage,
        format: OutputFormat,
        quality: f32,
    ) -> TranscodeResult<Bytes> {
        (**self).encode(image, format, quality)
    }
}

/// Pure-Rust decoding and resizing (`image`) with libwebp for lossy WebP output.
#[derive(Clone, Debug, Default)]
pub struct RustCodec {
    tracker: Option<BufferTracker>,
}

impl RustCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every surface this codec allocates to `tracker`.
    #[must_use]
    pub fn with_tracker(mut self, tracker: BufferTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    fn wrap(&self, pixels: DynamicImage) -> DecodedImage {
        match &self.tracker {
            Some(tracker) => DecodedImage::tracked(pixels, tracker),
            None => DecodedImage::new(pixels),
        }
    }
}

fn quality_percent(quality: f32) -> f32 {
    (quality * 100.0).clamp(1.0, 100.0)
}

fn decode_error(err: ImageError) -> TranscodeError {
    match err {
        ImageError::Limits(limit) => match limit.kind() {
            LimitErrorKind::InsufficientMemory | LimitErrorKind::DimensionError => {
                TranscodeError::ResourceExhausted(limit.to_string())
            }
            _ => TranscodeError::Decode(DecodeError::Unsupported(limit.to_string())),
        },
        ImageError::Unsupported(e) => TranscodeError::Decode(DecodeError::Unsupported(e.to_string())),
        ImageError::IoError(e) => TranscodeError::Decode(DecodeError::Malformed(e.to_string())),
        other => TranscodeError::Decode(DecodeError::Malformed(other.to_string())),
    }
}

impl ImageCodec for RustCodec {
    fn decode(&self, source: &[u8], max_bytes: u64) -> TranscodeResult<DecodedImage> {
        if source.is_empty() {
            return Err(DecodeError::Empty.into());
        }
        let mut reader = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;
        if reader.format().is_none() {
            return Err(DecodeError::UnrecognizedFormat.into());
        }
        let mut limits = Limits::default();
        limits.max_alloc = Some(max_bytes);
        reader.limits(limits);

        let pixels = reader.decode().map_err(decode_error)?;
        Ok(self.wrap(pixels))
    }

    fn resize(
        &self,
        image: &DecodedImage,
        width: u32,
        height: u32,
    ) -> TranscodeResult<DecodedImage> {
        if width == 0 || height == 0 {
            return Err(TranscodeError::Resize {
                width,
                height,
                reason: "empty target".to_string(),
            });
        }
        let pixels = image
            .pixels
            .resize_exact(width, height, FilterType::CatmullRom);
        Ok(image.derive(pixels))
    }

    fn encode(
        &self,
        image: &DecodedImage,
        format: OutputFormat,
        quality: f32,
    ) -> TranscodeResult<Bytes> {
        let percent = quality_percent(quality);
        match format {
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel.
                let rgb = image.pixels.to_rgb8();
                let mut out = Vec::new();
                JpegEncoder::new_with_quality(&mut out, percent.round() as u8)
                    .encode_image(&rgb)
                    .map_err(|e| TranscodeError::Encode {
                        format: format.as_str(),
                        reason: e.to_string(),
                    })?;
                Ok(Bytes::from(out))
            }
            OutputFormat::WebP => {
                let rgba = image.pixels.to_rgba8();
                let encoded = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                    .encode_simple(false, percent)
                    .map_err(|e| TranscodeError::Encode {
                        format: format.as_str(),
                        reason: format!("{e:?}"),
                    })?;
                Ok(Bytes::copy_from_slice(&*encoded))
            }
        }
    }
}
