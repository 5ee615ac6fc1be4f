#![forbid(unsafe_code)]

use std::{future::Future, sync::Arc};

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vitrine_core::VariantKind;
use vitrine_events::{EventBus, TranscodeEvent};

use crate::{
    codec::{DecodedImage, ImageCodec, RustCodec},
    error::{TranscodeError, TranscodeResult},
    options::{OutputFormat, TranscodeOptions, fit_within},
};

/// One encoded size/format variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedVariant {
    pub bytes: Bytes,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

/// The four variants derived from one source image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscodedVariants {
    pub baseline: EncodedVariant,
    pub modern: EncodedVariant,
    pub thumbnail_baseline: EncodedVariant,
    pub thumbnail_modern: EncodedVariant,
}

impl TranscodedVariants {
    pub fn get(&self, kind: VariantKind) -> &EncodedVariant {
        match kind {
            VariantKind::Baseline => &self.baseline,
            VariantKind::Modern => &self.modern,
            VariantKind::ThumbnailBaseline => &self.thumbnail_baseline,
            VariantKind::ThumbnailModern => &self.thumbnail_modern,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariantKind, &EncodedVariant)> {
        VariantKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }

    pub fn total_bytes(&self) -> u64 {
        self.iter().map(|(_, v)| v.bytes.len() as u64).sum()
    }
}

/// Derives full-size and thumbnail variants in a baseline and a modern format.
///
/// The source is decoded once on the blocking pool. The two target sizes are then
/// produced concurrently from the shared decoded image; the first failure cancels the
/// other job and fails the whole call.
pub struct Transcoder<C = RustCodec> {
    codec: Arc<C>,
    bus: Option<EventBus>,
}

impl<C> Clone for Transcoder<C> {
    fn clone(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
            bus: self.bus.clone(),
        }
    }
}

impl Default for Transcoder<RustCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcoder<RustCodec> {
    pub fn new() -> Self {
        Self::with_codec(RustCodec::new())
    }
}

impl<C: ImageCodec> Transcoder<C> {
    pub fn with_codec(codec: C) -> Self {
        Self {
            codec: Arc::new(codec),
            bus: None,
        }
    }

    #[must_use]
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// # Errors
    ///
    /// [`TranscodeError::Decode`] when `source` is not a readable image; any other
    /// variant when a resize or encode step fails. No partial output is returned.
    pub async fn transcode(
        &self,
        source: Bytes,
        options: &TranscodeOptions,
    ) -> TranscodeResult<TranscodedVariants> {
        let source_bytes = source.len() as u64;
        let result = self.run(source, options).await;
        match &result {
            Ok(variants) => {
                let output_bytes = variants.total_bytes();
                info!(source_bytes, output_bytes, "transcode complete");
                self.publish(TranscodeEvent::Completed {
                    source_bytes,
                    output_bytes,
                });
            }
            Err(e) => {
                warn!(source_bytes, error = %e, "transcode failed");
                self.publish(TranscodeEvent::Failed {
                    error: e.to_string(),
                });
            }
        }
        result
    }

    async fn run(
        &self,
        source: Bytes,
        options: &TranscodeOptions,
    ) -> TranscodeResult<TranscodedVariants> {
        options.validate()?;

        let codec = Arc::clone(&self.codec);
        let max_bytes = options.max_decode_bytes;
        let decoded = tokio::task::spawn_blocking(move || {
            let decoded = codec.decode(&source, max_bytes);
            drop(source);
            decoded
        })
        .await
        .map_err(|e| TranscodeError::Worker(e.to_string()))??;

        let (width, height) = decoded.dimensions();
        let full = fit_within(width, height, options.max_width, options.max_height);
        let thumb = fit_within(
            width,
            height,
            options.thumbnail_size,
            options.thumbnail_size,
        );
        debug!(width, height, ?full, ?thumb, "decoded source");

        let decoded = Arc::new(decoded);
        let cancel = CancellationToken::new();
        let (full_result, thumb_result) = tokio::join!(
            self.size_job(Arc::clone(&decoded), full, options.quality, cancel.clone()),
            self.size_job(
                Arc::clone(&decoded),
                thumb,
                options.thumbnail_quality,
                cancel.clone()
            ),
        );
        drop(decoded);

        let ((baseline, modern), (thumbnail_baseline, thumbnail_modern)) =
            first_failure(full_result, thumb_result)?;
        Ok(TranscodedVariants {
            baseline,
            modern,
            thumbnail_baseline,
            thumbnail_modern,
        })
    }

    fn size_job(
        &self,
        image: Arc<DecodedImage>,
        (width, height): (u32, u32),
        quality: f32,
        cancel: CancellationToken,
    ) -> impl Future<Output = TranscodeResult<(EncodedVariant, EncodedVariant)>> + Send + 'static
    {
        let codec = Arc::clone(&self.codec);
        let handle = tokio::task::spawn_blocking(move || {
            let result = encode_size(&*codec, &image, width, height, quality, &cancel);
            if result.is_err() {
                cancel.cancel();
            }
            result
        });
        async move {
            handle
                .await
                .map_err(|e| TranscodeError::Worker(e.to_string()))?
        }
    }

    fn publish(&self, event: TranscodeEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }
}

fn checkpoint(cancel: &CancellationToken) -> TranscodeResult<()> {
    if cancel.is_cancelled() {
        Err(TranscodeError::Cancelled)
    } else {
        Ok(())
    }
}

fn encode_size<C: ImageCodec>(
    codec: &C,
    image: &DecodedImage,
    width: u32,
    height: u32,
    quality: f32,
    cancel: &CancellationToken,
) -> TranscodeResult<(EncodedVariant, EncodedVariant)> {
    checkpoint(cancel)?;
    let resized;
    let surface = if image.dimensions() == (width, height) {
        image
    } else {
        resized = codec.resize(image, width, height)?;
        &resized
    };

    let encode = |format: OutputFormat| -> TranscodeResult<EncodedVariant> {
        checkpoint(cancel)?;
        let bytes = codec.encode(surface, format, quality)?;
        Ok(EncodedVariant {
            bytes,
            format,
            width: surface.width(),
            height: surface.height(),
        })
    };
    let baseline = encode(OutputFormat::Jpeg)?;
    let modern = encode(OutputFormat::WebP)?;
    Ok((baseline, modern))
}

/// Combine two job results, preferring a real failure over a sibling's cancellation.
fn first_failure<A, B>(a: TranscodeResult<A>, b: TranscodeResult<B>) -> TranscodeResult<(A, B)> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(TranscodeError::Cancelled), Err(e)) | (Err(e), _) | (_, Err(e)) => Err(e),
    }
}
