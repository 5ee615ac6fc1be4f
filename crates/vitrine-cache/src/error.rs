#![forbid(unsafe_code)]

use thiserror::Error;
use vitrine_core::CoreError;
use vitrine_net::NetError;

/// Cache store and lifecycle errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid store name: {0}")]
    InvalidStoreName(String),

    #[error("invalid key: {0}")]
    InvalidKey(#[from] CoreError),

    #[error("install of {version} failed: {reason}")]
    Install { version: String, reason: String },

    #[error("cannot {operation} while {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: &'static str,
    },

    #[error("storage task failed: {0}")]
    Task(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Typed outcome of an intercepted request that could not be answered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterceptError {
    /// Cache-first miss and the network failed.
    #[error("network failed and {key} is not cached: {source}")]
    Network { key: String, source: NetError },

    /// Network-first failed with no stored entry and no offline fallback for this request.
    #[error("offline with no cached fallback for {key}: {source}")]
    NoFallback { key: String, source: NetError },
}

impl InterceptError {
    pub fn key(&self) -> &str {
        match self {
            Self::Network { key, .. } | Self::NoFallback { key, .. } => key,
        }
    }

    /// The network failure behind the rejection.
    pub fn into_net_error(self) -> NetError {
        match self {
            Self::Network { source, .. } | Self::NoFallback { source, .. } => source,
        }
    }
}
