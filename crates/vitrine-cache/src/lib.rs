#![forbid(unsafe_code)]

//! # vitrine-cache
//!
//! Request-intercepting cache with a versioned pair of stores.
//!
//! A [`CacheController`] is driven through three steps:
//!
//! 1. [`install`](CacheController::install) primes `static-<version>` from the
//!    [`CacheManifest`], all-or-nothing.
//! 2. [`activate`](CacheController::activate) deletes every store of other versions and
//!    then claims open page contexts.
//! 3. [`handle_fetch`](CacheController::handle_fetch) answers each request with a
//!    [`FetchDecision`]: statics and allow-listed fonts are served cache-first, other
//!    same-origin GETs network-first with a stored or offline-root fallback.
//!
//! [`InterceptedNet`] wraps an activated controller as a plain [`Net`](vitrine_net::Net), so
//! loaders read through the cache without knowing it is there.
//!
//! Storage is pluggable via [`CacheStorage`]: [`MemCacheStorage`] for tests and
//! ephemeral use, [`DiskCacheStorage`] for persistence across restarts.

mod classify;
mod clients;
mod controller;
mod disk_store;
mod entry;
mod error;
mod evict;
mod intercept;
mod manifest;
mod mem_store;
mod storage;

pub use classify::{RequestClass, classify};
pub use clients::{Clients, NoClients};
pub use controller::{CacheController, FetchDecision, Phase};
pub use disk_store::DiskCacheStorage;
pub use entry::CacheEntry;
pub use error::{CacheError, CacheResult, InterceptError};
pub use intercept::InterceptedNet;
pub use manifest::{CacheManifest, StoreNames};
pub use mem_store::MemCacheStorage;
pub use storage::CacheStorage;
