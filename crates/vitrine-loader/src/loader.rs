use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;
use vitrine_core::{ClientCapabilities, ConnectionSource, ElementId, MediaKind};
use vitrine_events::{EventBus, LoaderEvent};
use vitrine_preload::{FetchHint, FetchPriority, HintDestination, HintSink, NullSink};

use crate::{
    fetcher::MediaFetcher,
    margin::MarginPolicy,
    props::LoaderProps,
    state::{LoaderInput, LoaderState, transition},
    viewport::{Observation, ViewportObserver},
};

/// What the element currently shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Presentation {
    #[default]
    Placeholder,
    /// Low-fidelity thumbnail while the final asset loads.
    Preview(Url),
    Final(Url),
    /// Inline failure indicator.
    Failed,
}

impl Presentation {
    pub fn failure_label(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Image => "Image failed to load",
            MediaKind::Video => "Video failed to load",
        }
    }
}

/// The one authoritative state of an element plus what it presents.
struct ElementCell {
    state: watch::Sender<LoaderState>,
    presentation: Mutex<Presentation>,
}

impl ElementCell {
    fn new() -> Self {
        let (state, _) = watch::channel(LoaderState::Idle);
        Self {
            state,
            presentation: Mutex::new(Presentation::Placeholder),
        }
    }

    /// Apply `input` while attached. Returns `(from, to)` when accepted.
    fn apply(
        &self,
        cancel: &CancellationToken,
        input: LoaderInput,
        presentation: Option<Presentation>,
    ) -> Option<(LoaderState, LoaderState)> {
        let mut shown = self.presentation.lock();
        if cancel.is_cancelled() {
            return None;
        }
        let changed = self.step(input)?;
        if let Some(p) = presentation {
            *shown = p;
        }
        Some(changed)
    }

    /// Cancel and unmount under the same lock as [`Self::apply`].
    fn detach(&self, cancel: &CancellationToken) -> Option<(LoaderState, LoaderState)> {
        let mut shown = self.presentation.lock();
        cancel.cancel();
        let changed = self.step(LoaderInput::Unmount)?;
        *shown = Presentation::Placeholder;
        Some(changed)
    }

    fn step(&self, input: LoaderInput) -> Option<(LoaderState, LoaderState)> {
        let mut changed = None;
        self.state.send_if_modified(|state| match transition(*state, input) {
            Some(next) => {
                changed = Some((*state, next));
                *state = next;
                true
            }
            None => false,
        });
        changed
    }

    fn state(&self) -> LoaderState {
        *self.state.borrow()
    }
}

/// Drives media elements from mount to `Loaded` or `Errored`.
///
/// Each mounted element runs its own task and shares nothing mutable with siblings.
/// The connection is sampled once per observation decision, never cached.
#[derive(Clone)]
pub struct ProgressiveLoader {
    fetcher: Arc<dyn MediaFetcher>,
    observer: Arc<dyn ViewportObserver>,
    connection: Arc<dyn ConnectionSource>,
    hints: Arc<dyn HintSink>,
    capabilities: ClientCapabilities,
    margins: MarginPolicy,
    events: Option<EventBus>,
}

impl ProgressiveLoader {
    pub fn new(
        fetcher: Arc<dyn MediaFetcher>,
        observer: Arc<dyn ViewportObserver>,
        connection: Arc<dyn ConnectionSource>,
    ) -> Self {
        Self {
            fetcher,
            observer,
            connection,
            hints: Arc::new(NullSink),
            capabilities: ClientCapabilities::default(),
            margins: MarginPolicy::default(),
            events: None,
        }
    }

    #[must_use]
    pub fn with_hint_sink(mut self, hints: Arc<dyn HintSink>) -> Self {
        self.hints = hints;
        self
    }

    #[must_use]
    pub fn with_capabilities(mut self, capabilities: ClientCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    #[must_use]
    pub fn with_margin_policy(mut self, margins: MarginPolicy) -> Self {
        self.margins = margins;
        self
    }

    #[must_use]
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    fn publish(&self, event: LoaderEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    /// Attach an element. Must be called within a tokio runtime.
    ///
    /// Dropping the returned handle unmounts the element.
    pub fn mount(&self, props: LoaderProps) -> MountedElement {
        let element = ElementId::next();
        let cell = Arc::new(ElementCell::new());
        let cancel = CancellationToken::new();
        let final_url = props.final_url(self.capabilities).clone();
        let initial = props
            .preview_url(self.capabilities)
            .cloned()
            .map_or(Presentation::Placeholder, Presentation::Preview);

        let hinted = (props.priority && props.kind == MediaKind::Image)
            .then(|| self.hint_priority(&final_url))
            .flatten();

        let immediate = props.starts_immediately();
        cell.apply(&cancel, LoaderInput::Mount { immediate }, Some(initial));

        let observation = if immediate {
            debug!(%element, url = %final_url, "loading at mount");
            None
        } else {
            let profile = self.connection.sample();
            let margin_px = self.margins.root_margin(&profile, props.preview, props.kind);
            debug!(
                %element,
                margin_px,
                effective_type = %profile.effective_type,
                save_data = profile.save_data,
                mobile = profile.is_mobile,
                "observing"
            );
            self.publish(LoaderEvent::Observing { element, margin_px });
            Some(self.observer.observe(element, margin_px))
        };

        let task = ElementTask {
            element,
            kind: props.kind,
            final_url,
            cell: Arc::clone(&cell),
            cancel: cancel.clone(),
            fetcher: Arc::clone(&self.fetcher),
            events: self.events.clone(),
        };
        tokio::spawn(task.run(observation));

        MountedElement {
            element,
            kind: props.kind,
            cell,
            cancel,
            hints: Arc::clone(&self.hints),
            hinted,
            events: self.events.clone(),
        }
    }

    fn hint_priority(&self, url: &Url) -> Option<Url> {
        let hint = FetchHint::preload(url.clone(), HintDestination::Image, FetchPriority::High);
        match self.hints.announce(&hint) {
            Ok(()) => Some(url.clone()),
            Err(e) => {
                debug!(%url, error = %e, "priority hint dropped");
                None
            }
        }
    }
}

struct ElementTask {
    element: ElementId,
    kind: MediaKind,
    final_url: Url,
    cell: Arc<ElementCell>,
    cancel: CancellationToken,
    fetcher: Arc<dyn MediaFetcher>,
    events: Option<EventBus>,
}

impl ElementTask {
    fn publish(&self, event: LoaderEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    async fn run(self, observation: Option<Observation>) {
        if let Some(mut observation) = observation {
            let fired = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return,
                fired = observation.intersected() => fired,
            };
            drop(observation);

            if !fired {
                self.fail("viewport observer closed before intersection".to_string());
                return;
            }
            if self
                .cell
                .apply(&self.cancel, LoaderInput::Intersected, None)
                .is_none()
            {
                return;
            }
            debug!(element = %self.element, "intersected");
        }

        self.load().await;
    }

    async fn load(&self) {
        let element = self.element;
        self.publish(LoaderEvent::FetchStarted {
            element,
            url: self.final_url.clone(),
        });

        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                debug!(%element, "fetch abandoned on unmount");
                return;
            }
            r = self.fetcher.fetch_media(&self.final_url, self.kind) => r,
        };

        match result {
            Ok(media) => {
                let shown = Presentation::Final(media.url.clone());
                if self
                    .cell
                    .apply(&self.cancel, LoaderInput::FinalReady, Some(shown))
                    .is_some()
                {
                    debug!(%element, url = %media.url, bytes = media.bytes.len(), "loaded");
                    self.publish(LoaderEvent::Loaded {
                        element,
                        url: media.url,
                    });
                }
            }
            Err(e) => self.fail(e.to_string()),
        }
    }

    fn fail(&self, error: String) {
        if self
            .cell
            .apply(&self.cancel, LoaderInput::FinalFailed, Some(Presentation::Failed))
            .is_some()
        {
            warn!(element = %self.element, url = %self.final_url, %error, "media failed to load");
            self.publish(LoaderEvent::Failed {
                element: self.element,
                url: self.final_url.clone(),
                error,
            });
        }
    }
}

/// Host-side handle of a mounted element.
pub struct MountedElement {
    element: ElementId,
    kind: MediaKind,
    cell: Arc<ElementCell>,
    cancel: CancellationToken,
    hints: Arc<dyn HintSink>,
    hinted: Option<Url>,
    events: Option<EventBus>,
}

impl MountedElement {
    pub fn id(&self) -> ElementId {
        self.element
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn state(&self) -> LoaderState {
        self.cell.state()
    }

    pub fn presentation(&self) -> Presentation {
        self.cell.presentation.lock().clone()
    }

    /// Wait until the element reaches a state accepted by `pred`.
    pub async fn wait_for(&self, pred: impl Fn(LoaderState) -> bool) -> LoaderState {
        let mut rx = self.cell.state.subscribe();
        match rx.wait_for(|s| pred(*s)).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    /// Wait for `Loaded` or `Errored`.
    pub async fn settled(&self) -> LoaderState {
        self.wait_for(LoaderState::is_terminal).await
    }

    /// Detach from the page. Equivalent to dropping the handle.
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for MountedElement {
    fn drop(&mut self) {
        let changed = self.cell.detach(&self.cancel);

        if let Some(url) = self.hinted.take()
            && let Err(e) = self.hints.withdraw(&url)
        {
            debug!(%url, error = %e, "priority hint withdraw dropped");
        }

        if let Some((from, _)) = changed
            && !from.is_terminal()
        {
            debug!(element = %self.element, state = %from, "abandoned");
            if let Some(bus) = &self.events {
                bus.publish(LoaderEvent::Abandoned {
                    element: self.element,
                });
            }
        }
    }
}

impl std::fmt::Debug for MountedElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedElement")
            .field("element", &self.element)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
