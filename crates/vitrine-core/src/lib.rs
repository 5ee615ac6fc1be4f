#![forbid(unsafe_code)]

//! Shared vocabulary for the vitrine media delivery crates.
//!
//! - [`MediaAsset`] / [`VariantSet`]: an uploaded item and its derived size/format variants.
//! - [`ConnectionProfile`]: a point-in-time snapshot of network and device conditions.
//! - [`RequestKey`]: canonical identity of a request, used as the cache key.

mod asset;
mod canonicalization;
mod connection;
mod element;
mod errors;

pub use asset::{MediaAsset, MediaKind, VariantKind, VariantSet};
pub use canonicalization::{RequestKey, canonicalize_request_url};
pub use connection::{
    ClientCapabilities, ConnectionProfile, ConnectionSource, EffectiveType, MOBILE_BREAKPOINT_PX,
    StaticConnection,
};
pub use element::ElementId;
pub use errors::{CoreError, CoreResult};
