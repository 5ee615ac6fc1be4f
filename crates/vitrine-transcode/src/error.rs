use thiserror::Error;
use vitrine_net::NetError;

/// The source bytes could not be read as an image.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty input")]
    Empty,

    #[error("unrecognized image format")]
    UnrecognizedFormat,

    #[error("unsupported image format: {0}")]
    Unsupported(String),

    #[error("malformed image data: {0}")]
    Malformed(String),
}

/// Transcoding failed as a whole; no variant is returned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranscodeError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("resize to {width}x{height} failed: {reason}")]
    Resize {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("{format} encode failed: {reason}")]
    Encode {
        format: &'static str,
        reason: String,
    },

    #[error("resource limit exceeded: {0}")]
    ResourceExhausted(String),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("cancelled after a sibling variant failed")]
    Cancelled,

    #[error("worker failed: {0}")]
    Worker(String),
}

pub type TranscodeResult<T> = Result<T, TranscodeError>;

/// An object store rejected or failed an upload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("upload of {name} rejected: {reason}")]
    Rejected { name: String, reason: String },

    #[error("upload failed: {0}")]
    Net(#[from] NetError),
}

/// Poster generation for a video failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PosterError {
    #[error("poster request failed: {0}")]
    Net(#[from] NetError),

    #[error("poster service returned HTTP {0}")]
    Status(u16),

    #[error("malformed poster response: {0}")]
    Malformed(String),
}
