use std::{sync::Arc, time::Duration};

use url::Url;
use vitrine::{
    cache::{CacheController, CacheManifest, CacheStorage, InterceptedNet},
    core::{ClientCapabilities, ConnectionProfile, StaticConnection},
    events::EventBus,
    loader::{LoaderState, MountedElement, NetMediaFetcher, ProgressiveLoader, ScrollViewport},
    preload::DocumentHead,
};
use vitrine_test_utils::MockNet;

use super::fixtures::{ORIGIN, url};

pub const VIEWPORT_HEIGHT: u32 = 800;

pub fn manifest(version: &str) -> CacheManifest {
    CacheManifest::default()
        .with_origin(Url::parse(ORIGIN).unwrap())
        .with_version(version)
        .with_precache(["/", "/index.css"])
}

/// Origin serving the application shell.
pub fn shell_net() -> MockNet {
    let net = MockNet::new();
    net.route(&url("/"), "<html>gallery shell</html>")
        .route(&url("/index.css"), "body{margin:0}");
    net
}

/// A page whose media reads go through an activated cache controller.
pub struct Site<S> {
    pub net: MockNet,
    pub controller: Arc<CacheController<MockNet, S>>,
    pub viewport: ScrollViewport,
    pub connection: Arc<StaticConnection>,
    pub head: Arc<DocumentHead>,
    pub bus: EventBus,
    pub loader: ProgressiveLoader,
}

impl<S: CacheStorage> Site<S> {
    pub async fn open(net: &MockNet, storage: S, version: &str) -> Self {
        let bus = EventBus::new(512);
        let controller = Arc::new(
            CacheController::new(manifest(version), net.clone(), storage)
                .with_event_bus(bus.clone()),
        );
        controller.install().await.unwrap();
        controller.activate().await.unwrap();

        let viewport = ScrollViewport::new(VIEWPORT_HEIGHT);
        let connection = Arc::new(StaticConnection::new(ConnectionProfile::mobile()));
        let head = Arc::new(DocumentHead::new());
        let fetcher = NetMediaFetcher::new(InterceptedNet::new(Arc::clone(&controller)));
        let loader = ProgressiveLoader::new(
            Arc::new(fetcher),
            Arc::new(viewport.clone()),
            connection.clone(),
        )
        .with_hint_sink(head.clone())
        .with_capabilities(ClientCapabilities::modern())
        .with_event_bus(bus.clone());

        Self {
            net: net.clone(),
            controller,
            viewport,
            connection,
            head,
            bus,
            loader,
        }
    }
}

pub async fn settled(el: &MountedElement) -> LoaderState {
    tokio::time::timeout(Duration::from_secs(10), el.settled())
        .await
        .expect("element did not settle")
}
