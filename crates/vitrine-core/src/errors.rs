use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
