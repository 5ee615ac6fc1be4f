#![forbid(unsafe_code)]

//! Deployment configuration loaded from JSON.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "transcode")]
    #[error(transparent)]
    Transcode(#[from] vitrine_transcode::TranscodeError),
}

/// Options for every enabled subsystem. Absent sections take their defaults.
///
/// ```ignore
/// let config = DeliveryConfig::from_json(r#"{
///     "cache": { "version": "v3" },
///     "transcode": { "quality": 0.8 }
/// }"#)?;
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    #[cfg(feature = "cache")]
    pub cache: vitrine_cache::CacheManifest,
    #[cfg(feature = "transcode")]
    pub transcode: vitrine_transcode::TranscodeOptions,
}

impl DeliveryConfig {
    /// Parse and validate.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] on malformed JSON or out-of-range transcode options.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        #[cfg(feature = "transcode")]
        config.transcode.validate()?;
        Ok(config)
    }
}
