#![forbid(unsafe_code)]

//! Advisory fetch hints for near-term images and routes.
//!
//! Nothing here is load-bearing: every hint may be ignored and every sink error is
//! dropped after a `debug!` log line.

mod hint;
mod scheduler;
mod sink;
mod warm;

pub use hint::{FetchHint, FetchPriority, HintDestination, HintKind};
pub use scheduler::{PreloadOptions, PreloadPlan, PreloadScheduler, ScheduledPreload};
pub use sink::{DocumentHead, HintError, HintSink, NullSink};
pub use warm::{WarmReport, warm_critical};
