#![forbid(unsafe_code)]

use std::{sync::Arc, time::Duration};

use tokio_util::sync::{CancellationToken, DropGuard};
use url::Url;

use crate::{
    hint::{FetchHint, FetchPriority, HintDestination},
    sink::{HintSink, announce_quietly},
};

#[derive(Clone, Debug, PartialEq)]
pub struct PreloadOptions {
    /// Leading URLs announced as `preload` right away.
    pub immediate_count: usize,
    /// Leading immediate URLs announced with high priority.
    pub high_priority_count: usize,
    /// Pause before the rest are announced as `prefetch`.
    pub deferred_delay: Duration,
    /// Warm-up pause on mobile devices.
    pub warm_delay_mobile: Duration,
    pub warm_delay_desktop: Duration,
}

impl Default for PreloadOptions {
    fn default() -> Self {
        Self {
            immediate_count: 6,
            high_priority_count: 3,
            deferred_delay: Duration::from_secs(1),
            warm_delay_mobile: Duration::from_secs(2),
            warm_delay_desktop: Duration::from_secs(1),
        }
    }
}

/// Split of candidate URLs into hints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreloadPlan {
    pub immediate: Vec<FetchHint>,
    pub deferred: Vec<FetchHint>,
}

impl PreloadPlan {
    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty() && self.deferred.is_empty()
    }
}

/// Handle to the deferred half of a [`PreloadScheduler::schedule`] call.
///
/// Dropping it cancels whatever has not been announced yet.
#[derive(Debug)]
pub struct ScheduledPreload {
    cancel: CancellationToken,
    _guard: DropGuard,
    task: tokio::task::JoinHandle<usize>,
}

impl ScheduledPreload {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the deferred set; returns how many hints were accepted by the sink.
    pub async fn finished(self) -> usize {
        let Self {
            task,
            _guard: guard,
            ..
        } = self;
        let accepted = task.await.unwrap_or(0);
        drop(guard);
        accepted
    }
}

/// Announces image hints for content about to scroll into view.
pub struct PreloadScheduler<S: ?Sized> {
    options: PreloadOptions,
    sink: Arc<S>,
}

impl<S: ?Sized> Clone for PreloadScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<S: HintSink + ?Sized + 'static> PreloadScheduler<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self::with_options(sink, PreloadOptions::default())
    }

    pub fn with_options(sink: Arc<S>, options: PreloadOptions) -> Self {
        Self { options, sink }
    }

    pub fn options(&self) -> &PreloadOptions {
        &self.options
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Pure split of `urls`; nothing is announced.
    pub fn plan<I>(&self, urls: I) -> PreloadPlan
    where
        I: IntoIterator<Item = Url>,
    {
        let mut plan = PreloadPlan::default();
        for (index, url) in urls.into_iter().enumerate() {
            if index < self.options.immediate_count {
                let priority = if index < self.options.high_priority_count {
                    FetchPriority::High
                } else {
                    FetchPriority::Auto
                };
                plan.immediate
                    .push(FetchHint::preload(url, HintDestination::Image, priority));
            } else {
                plan.deferred
                    .push(FetchHint::prefetch(url, HintDestination::Image));
            }
        }
        plan
    }

    /// Announce the immediate set now and the deferred set after `deferred_delay`.
    ///
    /// Must be called within a tokio runtime.
    pub fn schedule<I>(&self, urls: I) -> ScheduledPreload
    where
        I: IntoIterator<Item = Url>,
    {
        let PreloadPlan {
            immediate,
            deferred,
        } = self.plan(urls);

        let accepted = immediate
            .iter()
            .filter(|hint| announce_quietly(&*self.sink, hint))
            .count();
        tracing::debug!(
            immediate = immediate.len(),
            accepted,
            deferred = deferred.len(),
            "preload scheduled"
        );

        let cancel = CancellationToken::new();
        let task = {
            let cancel = cancel.clone();
            let sink = Arc::clone(&self.sink);
            let delay = self.options.deferred_delay;
            tokio::spawn(async move {
                if deferred.is_empty() {
                    return 0;
                }
                tokio::select! {
                    () = cancel.cancelled() => return 0,
                    () = tokio::time::sleep(delay) => {}
                }
                let mut accepted = 0;
                for hint in &deferred {
                    if cancel.is_cancelled() {
                        break;
                    }
                    if announce_quietly(&*sink, hint) {
                        accepted += 1;
                    }
                }
                accepted
            })
        };

        ScheduledPreload {
            _guard: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    /// Announce `paths` (relative to `origin`) as document prefetches.
    ///
    /// Returns the number of hints the sink accepted.
    pub fn prefetch_routes<'a, I>(&self, origin: &Url, paths: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        paths
            .into_iter()
            .filter_map(|path| match origin.join(path) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::debug!(path, error = %e, "route not prefetched");
                    None
                }
            })
            .filter(|url| {
                announce_quietly(
                    &*self.sink,
                    &FetchHint::prefetch(url.clone(), HintDestination::Document),
                )
            })
            .count()
    }
}
