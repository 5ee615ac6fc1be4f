#![forbid(unsafe_code)]

//! # vitrine-transcode
//!
//! Turns one uploaded image into four delivery variants: full-size and thumbnail, each as
//! JPEG (baseline) and lossy WebP (modern).
//!
//! ```ignore
//! let variants = Transcoder::new()
//!     .transcode(upload, &TranscodeOptions::default())
//!     .await?;
//! let asset = publish(&variants, &store).await?;
//! ```
//!
//! Videos are not transcoded; a [`PosterGenerator`] supplies their still image.

mod codec;
mod error;
mod options;
mod poster;
mod publish;
mod transcoder;

pub use codec::{BufferTracker, DecodedImage, ImageCodec, RustCodec};
pub use error::{DecodeError, PosterError, PublishError, TranscodeError, TranscodeResult};
pub use options::{OutputFormat, TranscodeOptions, fit_within};
pub use poster::{HttpPosterGenerator, PosterGenerator};
pub use publish::{
    HttpObjectStore, MemObjectStore, ObjectStore, publish, publish_as, variant_object_name,
};
pub use transcoder::{EncodedVariant, TranscodedVariants, Transcoder};
