use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use vitrine_core::ElementId;

/// Registration of one element with a [`ViewportObserver`].
///
/// Fires at most once. Dropping it unregisters the element, whether it fired or not.
pub struct Observation {
    element: ElementId,
    margin_px: u32,
    fired: oneshot::Receiver<()>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Observation {
    /// `release` runs exactly once, on drop.
    pub fn new(
        element: ElementId,
        margin_px: u32,
        fired: oneshot::Receiver<()>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            element,
            margin_px,
            fired,
            release: Some(Box::new(release)),
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn margin_px(&self) -> u32 {
        self.margin_px
    }

    /// Resolves on the first qualifying intersection.
    ///
    /// Returns `false` if the observer went away without firing.
    pub async fn intersected(&mut self) -> bool {
        (&mut self.fired).await.is_ok()
    }
}

impl Drop for Observation {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observation")
            .field("element", &self.element)
            .field("margin_px", &self.margin_px)
            .finish_non_exhaustive()
    }
}

/// Reports when an element comes within a margin of the visible area.
pub trait ViewportObserver: Send + Sync {
    fn observe(&self, element: ElementId, margin_px: u32) -> Observation;
}

impl<O: ViewportObserver + ?Sized> ViewportObserver for Arc<O> {
    fn observe(&self, element: ElementId, margin_px: u32) -> Observation {
        (**self).observe(element, margin_px)
    }
}

#[derive(Clone, Copy, Debug)]
struct ElementBox {
    top: u32,
    height: u32,
}

struct Watch {
    id: u64,
    margin_px: u32,
    tx: oneshot::Sender<()>,
}

#[derive(Default)]
struct Geometry {
    height: u32,
    scroll_top: u32,
    layout: HashMap<ElementId, ElementBox>,
    watches: HashMap<ElementId, Watch>,
    next_watch: u64,
}

impl Geometry {
    fn intersects(&self, element: ElementId, margin_px: u32) -> bool {
        let Some(b) = self.layout.get(&element) else {
            return false;
        };
        let margin = i64::from(margin_px);
        let view_top = i64::from(self.scroll_top) - margin;
        let view_bottom = i64::from(self.scroll_top) + i64::from(self.height) + margin;
        let top = i64::from(b.top);
        let bottom = top + i64::from(b.height);
        top <= view_bottom && bottom >= view_top
    }

    fn fire_ready(&mut self) {
        let ready: Vec<ElementId> = self
            .watches
            .iter()
            .filter(|(el, w)| self.intersects(**el, w.margin_px))
            .map(|(el, _)| *el)
            .collect();
        for element in ready {
            if let Some(watch) = self.watches.remove(&element) {
                tracing::trace!(%element, margin_px = watch.margin_px, "intersection");
                let _ = watch.tx.send(());
            }
        }
    }
}

/// Geometry-driven [`ViewportObserver`]: a vertical scroll container with laid-out elements.
///
/// Elements intersect when their box overlaps the visible range grown by the margin on
/// both edges. A fired element is unregistered before its [`Observation`] resolves.
#[derive(Clone, Default)]
pub struct ScrollViewport {
    inner: Arc<Mutex<Geometry>>,
}

impl ScrollViewport {
    pub fn new(height: u32) -> Self {
        let viewport = Self::default();
        viewport.inner.lock().height = height;
        viewport
    }

    /// Lay out `element` at `top` (document coordinates).
    pub fn place(&self, element: ElementId, top: u32, height: u32) {
        let mut geo = self.inner.lock();
        geo.layout.insert(element, ElementBox { top, height });
        geo.fire_ready();
    }

    pub fn scroll_to(&self, scroll_top: u32) {
        let mut geo = self.inner.lock();
        geo.scroll_top = scroll_top;
        geo.fire_ready();
    }

    pub fn resize(&self, height: u32) {
        let mut geo = self.inner.lock();
        geo.height = height;
        geo.fire_ready();
    }

    pub fn scroll_top(&self) -> u32 {
        self.inner.lock().scroll_top
    }

    /// Elements still waiting for an intersection.
    pub fn active_observations(&self) -> usize {
        self.inner.lock().watches.len()
    }

    pub fn is_observing(&self, element: ElementId) -> bool {
        self.inner.lock().watches.contains_key(&element)
    }
}

impl ViewportObserver for ScrollViewport {
    fn observe(&self, element: ElementId, margin_px: u32) -> Observation {
        let (tx, rx) = oneshot::channel();
        let id = {
            let mut geo = self.inner.lock();
            geo.next_watch += 1;
            let id = geo.next_watch;
            geo.watches.insert(element, Watch { id, margin_px, tx });
            geo.fire_ready();
            id
        };

        let weak: Weak<Mutex<Geometry>> = Arc::downgrade(&self.inner);
        Observation::new(element, margin_px, rx, move || {
            if let Some(inner) = weak.upgrade() {
                let mut geo = inner.lock();
                if geo.watches.get(&element).is_some_and(|w| w.id == id) {
                    geo.watches.remove(&element);
                }
            }
        })
    }
}
