#![forbid(unsafe_code)]

use std::fmt;

/// Lifecycle of one media element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoaderState {
    #[default]
    Idle,
    /// Waiting for the element to come within the root margin.
    Observing,
    /// Final asset requested.
    Loading,
    Loaded,
    Errored,
}

impl LoaderState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Observing => "observing",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Errored => "errored",
        }
    }

    /// `Loaded` and `Errored` accept nothing but `Unmount`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Errored)
    }
}

impl fmt::Display for LoaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named events that drive [`transition`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoaderInput {
    /// Element attached. `immediate` skips observation (priority, eager or immediate preview).
    Mount { immediate: bool },
    /// First qualifying intersection.
    Intersected,
    FinalReady,
    FinalFailed,
    Unmount,
}

/// Next state for `input`, or `None` when `input` is not accepted in `state`.
///
/// Unmount from any attached state returns the element to `Idle`.
pub fn transition(state: LoaderState, input: LoaderInput) -> Option<LoaderState> {
    use LoaderInput as I;
    use LoaderState as S;

    match (state, input) {
        (S::Idle, I::Mount { immediate: false }) => Some(S::Observing),
        (S::Idle, I::Mount { immediate: true }) | (S::Observing, I::Intersected) => {
            Some(S::Loading)
        }
        (S::Loading, I::FinalReady) => Some(S::Loaded),
        (S::Observing | S::Loading, I::FinalFailed) => Some(S::Errored),
        (S::Idle, I::Unmount) => None,
        (_, I::Unmount) => Some(S::Idle),
        _ => None,
    }
}
