#![forbid(unsafe_code)]

use url::Url;
use vitrine_core::ElementId;

/// Events emitted by progressive loaders. `Loaded`/`Failed` are the host's
/// `onLoad`/`onError` callbacks.
#[derive(Clone, Debug, PartialEq)]
pub enum LoaderEvent {
    /// Element is waiting to come within `margin_px` of the viewport.
    Observing { element: ElementId, margin_px: u32 },
    /// Final asset fetch started.
    FetchStarted { element: ElementId, url: Url },
    /// Final asset decoded and shown.
    Loaded { element: ElementId, url: Url },
    /// Final asset failed; the element shows its failure placeholder.
    Failed {
        element: ElementId,
        url: Url,
        error: String,
    },
    /// Element unmounted before loading completed.
    Abandoned { element: ElementId },
}
