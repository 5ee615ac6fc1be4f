#![forbid(unsafe_code)]

/// Where an intercepted response came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServedFrom {
    Network,
    Cache,
    OfflineRoot,
}

/// Lifecycle and interception events of the cache controller.
#[derive(Clone, Debug, PartialEq)]
pub enum CacheEvent {
    Installed { version: String, entries: usize },
    InstallFailed { version: String, error: String },
    Activated { version: String, deleted: Vec<String> },
    Served { key: String, from: ServedFrom },
    /// Write-through failed; the response was still delivered.
    WriteFailed { store: String, key: String, error: String },
}
