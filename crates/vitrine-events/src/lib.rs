#![forbid(unsafe_code)]

//! Unified event bus for the vitrine delivery pipeline.

mod bus;
mod cache;
mod event;
mod loader;
mod transcode;

pub use bus::EventBus;
pub use cache::{CacheEvent, ServedFrom};
pub use event::Event;
pub use loader::LoaderEvent;
pub use transcode::TranscodeEvent;
