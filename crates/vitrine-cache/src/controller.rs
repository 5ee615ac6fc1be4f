#![forbid(unsafe_code)]

use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use url::Url;
use vitrine_core::RequestKey;
use vitrine_events::{CacheEvent, EventBus, ServedFrom};
use vitrine_net::{Destination, Net, Request, Response};

use crate::{
    classify::{RequestClass, classify},
    clients::{Clients, NoClients},
    entry::CacheEntry,
    error::{CacheError, CacheResult, InterceptError},
    evict::trim_store,
    manifest::{CacheManifest, StoreNames},
    storage::CacheStorage,
};

/// Lifecycle position of a [`CacheController`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this controller never serves.
    Redundant,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of intercepting one request. Exactly one is produced per request.
#[derive(Debug, PartialEq)]
pub enum FetchDecision {
    /// Let the host perform the request unmodified.
    PassThrough,
    Respond(Response),
    Reject(InterceptError),
}

impl FetchDecision {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Respond(response) => Some(response),
            _ => None,
        }
    }
}

/// Versioned dual-store cache in front of a [`Net`].
pub struct CacheController<N, S> {
    manifest: CacheManifest,
    names: StoreNames,
    net: N,
    storage: S,
    clients: Arc<dyn Clients>,
    bus: Option<EventBus>,
    phase: Mutex<Phase>,
}

impl<N, S> CacheController<N, S>
where
    N: Net,
    S: CacheStorage,
{
    pub fn new(manifest: CacheManifest, net: N, storage: S) -> Self {
        let names = manifest.store_names();
        Self {
            manifest,
            names,
            net,
            storage,
            clients: Arc::new(NoClients),
            bus: None,
            phase: Mutex::new(Phase::Parsed),
        }
    }

    #[must_use]
    pub fn with_clients(mut self, clients: Arc<dyn Clients>) -> Self {
        self.clients = clients;
        self
    }

    #[must_use]
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn manifest(&self) -> &CacheManifest {
        &self.manifest
    }

    pub fn store_names(&self) -> &StoreNames {
        &self.names
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Network used for precaching, misses and pass-through.
    pub fn net(&self) -> &N {
        &self.net
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// Fetch every precache entry and store it in the static store.
    ///
    /// All-or-nothing: nothing is written unless every entry fetched with a 2xx status,
    /// and a failed write removes the static store again if this install created it.
    ///
    /// # Errors
    ///
    /// [`CacheError::Install`] on any fetch or write failure (the controller becomes
    /// [`Phase::Redundant`]); [`CacheError::InvalidPhase`] unless freshly parsed.
    pub async fn install(&self) -> CacheResult<usize> {
        self.enter("install", &[Phase::Parsed], Phase::Installing)?;
        let version = self.manifest.version.clone();

        match self.prime().await {
            Ok(entries) => {
                self.set_phase(Phase::Installed);
                info!(%version, entries, store = %self.names.static_store, "install complete");
                self.publish(CacheEvent::Installed { version, entries });
                Ok(entries)
            }
            Err(e) => {
                self.set_phase(Phase::Redundant);
                warn!(%version, error = %e, "install failed");
                self.publish(CacheEvent::InstallFailed {
                    version,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn prime(&self) -> CacheResult<usize> {
        let urls = self.manifest.precache_urls()?;
        let fetched = futures::future::try_join_all(urls.into_iter().map(|url| async move {
            let response = self
                .net
                .fetch(Request::get(url.clone()))
                .await
                .map_err(|e| self.install_error(format!("{url}: {e}")))?;
            if !response.is_success() {
                return Err(self.install_error(format!("{url}: HTTP {}", response.status)));
            }
            let key = RequestKey::from_url(&url)?;
            Ok::<_, CacheError>((key, response))
        }))
        .await?;

        let store = &self.names.static_store;
        let existed = self.storage.has_store(store).await?;
        self.storage.open(store).await?;
        for (key, response) in &fetched {
            let entry = CacheEntry::from_response(key.clone(), response);
            if let Err(e) = self.storage.put(store, entry).await {
                if !existed && let Err(cleanup) = self.storage.delete_store(store).await {
                    warn!(store = %store, error = %cleanup, "could not remove partially primed store");
                }
                return Err(self.install_error(format!("write {key}: {e}")));
            }
        }
        Ok(fetched.len())
    }

    /// Delete every store not owned by this version, then claim page contexts.
    ///
    /// Returns the deleted store names. Calling it again after success is a no-op sweep.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidPhase`] before a successful install; storage or claim errors
    /// leave the controller `Installed` so activation can be retried.
    pub async fn activate(&self) -> CacheResult<Vec<String>> {
        self.enter(
            "activate",
            &[Phase::Installed, Phase::Activated],
            Phase::Activating,
        )?;

        match self.sweep().await {
            Ok(deleted) => {
                self.set_phase(Phase::Activated);
                info!(version = %self.manifest.version, ?deleted, "activated");
                self.publish(CacheEvent::Activated {
                    version: self.manifest.version.clone(),
                    deleted: deleted.clone(),
                });
                Ok(deleted)
            }
            Err(e) => {
                self.set_phase(Phase::Installed);
                warn!(error = %e, "activation failed");
                Err(e)
            }
        }
    }

    async fn sweep(&self) -> CacheResult<Vec<String>> {
        let stale: Vec<String> = self
            .storage
            .store_names()
            .await?
            .into_iter()
            .filter(|name| !self.names.contains(name))
            .collect();

        let results =
            futures::future::join_all(stale.iter().map(|name| self.storage.delete_store(name)))
                .await;
        for result in results {
            result?;
        }

        for name in self.names.iter() {
            self.storage.open(name).await?;
        }
        self.clients.claim().await?;
        Ok(stale)
    }

    /// Decide how to answer `request`. Only an activated controller intercepts.
    pub async fn handle_fetch(&self, request: &Request) -> FetchDecision {
        if self.phase() != Phase::Activated {
            return FetchDecision::PassThrough;
        }
        let class = classify(request, &self.manifest);
        if class == RequestClass::Bypass {
            return FetchDecision::PassThrough;
        }
        let Ok(key) = RequestKey::from_url(&request.url) else {
            return FetchDecision::PassThrough;
        };

        match class {
            RequestClass::Static => self.cache_first(request, key).await,
            RequestClass::Dynamic => self.network_first(request, key).await,
            RequestClass::Bypass => FetchDecision::PassThrough,
        }
    }

    async fn cache_first(&self, request: &Request, key: RequestKey) -> FetchDecision {
        if let Some(entry) = self.lookup(&key, self.names.iter()).await {
            self.served(&key, ServedFrom::Cache);
            return FetchDecision::Respond(entry.to_response());
        }

        match self.net.fetch(request.clone()).await {
            Ok(response) => {
                if response.is_success() {
                    self.write_through(&self.names.static_store, &key, &response)
                        .await;
                }
                self.served(&key, ServedFrom::Network);
                FetchDecision::Respond(response)
            }
            Err(source) => {
                debug!(%key, error = %source, "cache-first miss and network failed");
                FetchDecision::Reject(InterceptError::Network {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    async fn network_first(&self, request: &Request, key: RequestKey) -> FetchDecision {
        let source = match self.net.fetch(request.clone()).await {
            Ok(response) => {
                if response.is_success() {
                    let store = &self.names.dynamic_store;
                    self.write_through(store, &key, &response).await;
                    if let Some(max) = self.manifest.max_dynamic_entries
                        && let Err(e) = trim_store(&self.storage, store, max).await
                    {
                        warn!(store = %store, error = %e, "dynamic eviction failed");
                    }
                }
                self.served(&key, ServedFrom::Network);
                return FetchDecision::Respond(response);
            }
            Err(source) => source,
        };

        debug!(%key, error = %source, "network-first fetch failed, trying stores");
        // Dynamic first: it holds the latest network copy.
        if let Some(entry) = self.lookup(&key, self.names.iter().rev()).await {
            self.served(&key, ServedFrom::Cache);
            return FetchDecision::Respond(entry.to_response());
        }

        if request.destination == Destination::Document
            && let Some(root) = self.offline_root().await
        {
            self.served(&key, ServedFrom::OfflineRoot);
            return FetchDecision::Respond(root);
        }

        FetchDecision::Reject(InterceptError::NoFallback {
            key: key.to_string(),
            source,
        })
    }

    /// Stored response for `url` in this version's stores, static first.
    pub async fn cached(&self, url: &Url) -> Option<Response> {
        let key = RequestKey::from_url(url).ok()?;
        self.lookup(&key, self.names.iter())
            .await
            .map(|e| e.to_response())
    }

    async fn lookup<'a>(
        &self,
        key: &RequestKey,
        stores: impl IntoIterator<Item = &'a str>,
    ) -> Option<CacheEntry> {
        for store in stores {
            match self.storage.get(store, key).await {
                Ok(Some(entry)) => return Some(entry),
                Ok(None) => {}
                Err(e) => warn!(store, %key, error = %e, "store read failed, treating as miss"),
            }
        }
        None
    }

    async fn offline_root(&self) -> Option<Response> {
        let root = match self.manifest.offline_root_url() {
            Ok(root) => root,
            Err(e) => {
                warn!(error = %e, "offline root does not resolve");
                return None;
            }
        };
        let key = RequestKey::from_url(&root).ok()?;
        self.lookup(&key, self.names.iter().rev())
            .await
            .map(|e| e.to_response())
    }

    async fn write_through(&self, store: &str, key: &RequestKey, response: &Response) {
        let entry = CacheEntry::from_response(key.clone(), response);
        if let Err(e) = self.storage.put(store, entry).await {
            warn!(store, %key, error = %e, "write-through failed");
            self.publish(CacheEvent::WriteFailed {
                store: store.to_string(),
                key: key.to_string(),
                error: e.to_string(),
            });
        }
    }

    fn enter(&self, operation: &'static str, from: &[Phase], to: Phase) -> CacheResult<()> {
        let mut phase = self.phase.lock();
        if !from.contains(&*phase) {
            return Err(CacheError::InvalidPhase {
                operation,
                phase: phase.as_str(),
            });
        }
        *phase = to;
        Ok(())
    }

    fn set_phase(&self, phase: Phase) {
        *self.phase.lock() = phase;
    }

    fn install_error(&self, reason: String) -> CacheError {
        CacheError::Install {
            version: self.manifest.version.clone(),
            reason,
        }
    }

    fn served(&self, key: &RequestKey, from: ServedFrom) {
        self.publish(CacheEvent::Served {
            key: key.to_string(),
            from,
        });
    }

    fn publish(&self, event: CacheEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }
}
