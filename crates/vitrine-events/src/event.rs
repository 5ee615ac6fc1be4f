#![forbid(unsafe_code)]

use crate::{CacheEvent, LoaderEvent, TranscodeEvent};

/// Unified event, one variant per subsystem.
#[derive(Clone, Debug)]
pub enum Event {
    Loader(LoaderEvent),
    Cache(CacheEvent),
    Transcode(TranscodeEvent),
}

impl From<LoaderEvent> for Event {
    fn from(e: LoaderEvent) -> Self {
        Self::Loader(e)
    }
}

impl From<CacheEvent> for Event {
    fn from(e: CacheEvent) -> Self {
        Self::Cache(e)
    }
}

impl From<TranscodeEvent> for Event {
    fn from(e: TranscodeEvent) -> Self {
        Self::Transcode(e)
    }
}
