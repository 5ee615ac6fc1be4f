use thiserror::Error;
use vitrine_net::NetError;

/// Why an element ended up in [`LoaderState::Errored`](crate::LoaderState::Errored).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("network error: {0}")]
    Net(#[from] NetError),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("empty response body")]
    Empty,

    #[error("object URL: {0}")]
    ObjectUrl(String),

    #[error("load task failed: {0}")]
    Task(String),
}

pub type LoadResult<T> = Result<T, LoadError>;
