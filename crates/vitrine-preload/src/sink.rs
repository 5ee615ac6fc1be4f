#![forbid(unsafe_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use url::Url;

use crate::hint::{FetchHint, HintKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HintError {
    #[error("hint rejected: {0}")]
    Rejected(String),

    #[error("hint sink closed")]
    Closed,
}

/// Consumer of advisory hints (a document head, a response header writer, ...).
///
/// Callers log and drop every error: a failed hint is a no-op.
pub trait HintSink: Send + Sync {
    /// # Errors
    ///
    /// Any [`HintError`]; never fatal.
    fn announce(&self, hint: &FetchHint) -> Result<(), HintError>;

    /// Retract every hint for `url`.
    ///
    /// # Errors
    ///
    /// Any [`HintError`]; never fatal.
    fn withdraw(&self, url: &Url) -> Result<(), HintError> {
        let _ = url;
        Ok(())
    }
}

impl<S: HintSink + ?Sized> HintSink for Arc<S> {
    fn announce(&self, hint: &FetchHint) -> Result<(), HintError> {
        (**self).announce(hint)
    }

    fn withdraw(&self, url: &Url) -> Result<(), HintError> {
        (**self).withdraw(url)
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl HintSink for NullSink {
    fn announce(&self, _hint: &FetchHint) -> Result<(), HintError> {
        Ok(())
    }
}

/// Collects hints as `<link>` elements for the document `<head>`.
///
/// Re-announcing the same URL with the same [`HintKind`] replaces the earlier hint.
#[derive(Debug, Default)]
pub struct DocumentHead {
    links: Mutex<Vec<FetchHint>>,
}

impl DocumentHead {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current hints in announcement order.
    pub fn links(&self) -> Vec<FetchHint> {
        self.links.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.links.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.lock().is_empty()
    }

    pub fn contains(&self, url: &Url, kind: HintKind) -> bool {
        self.links
            .lock()
            .iter()
            .any(|h| h.url == *url && h.kind == kind)
    }

    /// All hints rendered one `<link>` per line.
    pub fn render(&self) -> String {
        self.links
            .lock()
            .iter()
            .map(FetchHint::to_link_tag)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl HintSink for DocumentHead {
    fn announce(&self, hint: &FetchHint) -> Result<(), HintError> {
        let mut links = self.links.lock();
        match links
            .iter_mut()
            .find(|h| h.url == hint.url && h.kind == hint.kind)
        {
            Some(existing) => *existing = hint.clone(),
            None => links.push(hint.clone()),
        }
        Ok(())
    }

    fn withdraw(&self, url: &Url) -> Result<(), HintError> {
        self.links.lock().retain(|h| h.url != *url);
        Ok(())
    }
}

/// Announce `hint`, logging and dropping any failure.
pub(crate) fn announce_quietly<S: HintSink + ?Sized>(sink: &S, hint: &FetchHint) -> bool {
    match sink.announce(hint) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(url = %hint.url, kind = hint.kind.as_str(), error = %e, "hint dropped");
            false
        }
    }
}
