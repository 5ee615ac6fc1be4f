#![forbid(unsafe_code)]

//! Progressive loading of media elements.
//!
//! One [`MountedElement`] per media tile. An element waits in `Observing` until it comes
//! within a connection-aware root margin of the viewport, then fetches its final asset once:
//!
//! ```text
//! Idle -> Observing -> Loading -> Loaded
//!            \            \
//!             +------------+--> Errored
//! ```
//!
//! An observer that goes away before reporting an intersection errors the element.
//! Priority, eager and immediate-preview elements skip observation. Nothing is retried.

mod error;
mod fetcher;
mod loader;
mod margin;
mod object_url;
mod props;
mod state;
mod viewport;

pub use error::{LoadError, LoadResult};
pub use fetcher::{FetchedMedia, MediaFetcher, NetMediaFetcher};
pub use loader::{MountedElement, Presentation, ProgressiveLoader};
pub use margin::MarginPolicy;
pub use object_url::{LocalPreview, MemoryObjectUrls, ObjectUrl, ObjectUrlRegistry};
pub use props::{LoaderProps, PreviewMode};
pub use state::{LoaderInput, LoaderState, transition};
pub use viewport::{Observation, ScrollViewport, ViewportObserver};
