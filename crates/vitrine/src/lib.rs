#![forbid(unsafe_code)]

//! # Vitrine
//!
//! Facade crate for adaptive media delivery.
//!
//! ## Quick start
//!
//! ```ignore
//! use vitrine::prelude::*;
//!
//! let variants = Transcoder::new().transcode(upload, &TranscodeOptions::default()).await?;
//! let asset = publish(&variants, &store).await?;
//!
//! let element = loader.mount(LoaderProps::from_asset(&asset));
//! element.settled().await;
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod core {
    pub use vitrine_core::*;
}

pub mod events {
    pub use vitrine_events::*;
}

pub mod net {
    pub use vitrine_net::*;
}

#[cfg(feature = "cache")]
pub mod cache {
    pub use vitrine_cache::*;
}

#[cfg(feature = "transcode")]
pub mod transcode {
    pub use vitrine_transcode::*;
}

#[cfg(feature = "loader")]
pub mod loader {
    pub use vitrine_loader::*;
}

#[cfg(feature = "preload")]
pub mod preload {
    pub use vitrine_preload::*;
}

// ── Configuration ───────────────────────────────────────────────────────

mod config;

pub use config::{ConfigError, DeliveryConfig};

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    #[cfg(feature = "cache")]
    pub use vitrine_cache::{
        CacheController, CacheManifest, DiskCacheStorage, FetchDecision, InterceptError,
        InterceptedNet, MemCacheStorage,
    };
    pub use vitrine_core::{
        ClientCapabilities, ConnectionProfile, ConnectionSource, EffectiveType, MediaAsset,
        MediaKind, StaticConnection, VariantSet,
    };
    pub use vitrine_events::{Event, EventBus};
    #[cfg(feature = "loader")]
    pub use vitrine_loader::{
        LoaderProps, LoaderState, MountedElement, NetMediaFetcher, Presentation, PreviewMode,
        ProgressiveLoader, ScrollViewport,
    };
    pub use vitrine_net::{HttpClient, Net, NetError, NetOptions, Request, Response};
    #[cfg(feature = "preload")]
    pub use vitrine_preload::{DocumentHead, PreloadOptions, PreloadScheduler};
    #[cfg(feature = "transcode")]
    pub use vitrine_transcode::{
        ObjectStore, TranscodeError, TranscodeOptions, TranscodedVariants, Transcoder, publish,
    };

    pub use crate::DeliveryConfig;
}
