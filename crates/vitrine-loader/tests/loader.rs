use std::{sync::Arc, time::Duration};

use rstest::*;
use tokio::sync::broadcast;
use url::Url;
use vitrine_core::{
    ClientCapabilities, ConnectionProfile, EffectiveType, ElementId, MediaAsset, MediaKind,
    StaticConnection, VariantSet,
};
use vitrine_events::{Event, EventBus, LoaderEvent};
use vitrine_loader::{
    LoadError, LoaderProps, LoaderState, MountedElement, NetMediaFetcher, Observation,
    Presentation, PreviewMode, ProgressiveLoader, ScrollViewport, ViewportObserver,
};
use vitrine_net::{Destination, NetError};
use vitrine_preload::{DocumentHead, FetchPriority, HintKind};
use vitrine_test_utils::{MockNet, jpeg_fixture, png_fixture};

const VIEWPORT_HEIGHT: u32 = 800;

fn url(path: &str) -> Url {
    Url::parse("https://cdn.test/").unwrap().join(path).unwrap()
}

struct Page {
    net: MockNet,
    viewport: ScrollViewport,
    connection: Arc<StaticConnection>,
    head: Arc<DocumentHead>,
    bus: EventBus,
    loader: ProgressiveLoader,
}

impl Page {
    fn new(profile: ConnectionProfile) -> Self {
        Self::with_capabilities(profile, ClientCapabilities::default())
    }

    fn with_capabilities(profile: ConnectionProfile, caps: ClientCapabilities) -> Self {
        let net = MockNet::new();
        let viewport = ScrollViewport::new(VIEWPORT_HEIGHT);
        let connection = Arc::new(StaticConnection::new(profile));
        let head = Arc::new(DocumentHead::new());
        let bus = EventBus::new(256);
        let loader = ProgressiveLoader::new(
            Arc::new(NetMediaFetcher::new(net.clone())),
            Arc::new(viewport.clone()),
            connection.clone(),
        )
        .with_hint_sink(head.clone())
        .with_capabilities(caps)
        .with_event_bus(bus.clone());
        Self {
            net,
            viewport,
            connection,
            head,
            bus,
            loader,
        }
    }

    /// Serve a decodable JPEG at `path`.
    fn serve(&self, path: &str) -> Url {
        let u = url(path);
        self.net.route(&u, jpeg_fixture(32, 24));
        u
    }
}

async fn let_tasks_run() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

async fn settled(el: &MountedElement) -> LoaderState {
    tokio::time::timeout(Duration::from_secs(5), el.settled())
        .await
        .expect("element did not settle")
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<LoaderEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Loader(e) = event {
            out.push(e);
        }
    }
    out
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn offscreen_element_never_fetches() {
    let page = Page::new(ConnectionProfile::mobile());
    let src = page.serve("far.jpg");

    let el = page
        .loader
        .mount(LoaderProps::new(src.clone(), MediaKind::Image));
    page.viewport.place(el.id(), 10_000, 300);
    let_tasks_run().await;

    assert_eq!(el.state(), LoaderState::Observing);
    assert_eq!(el.presentation(), Presentation::Placeholder);
    assert_eq!(page.net.total_hits(), 0);

    el.unmount();
    let_tasks_run().await;
    assert_eq!(page.net.total_hits(), 0);
    assert_eq!(page.viewport.active_observations(), 0);
}

#[rstest]
#[case::two_g(ConnectionProfile::mobile().with_effective_type(EffectiveType::TwoG))]
#[case::slow_two_g(ConnectionProfile::mobile().with_effective_type(EffectiveType::Slow2g))]
#[case::save_data(ConnectionProfile::mobile().with_save_data(true))]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn constrained_connection_waits_until_100px(#[case] profile: ConnectionProfile) {
    let page = Page::new(profile);
    let src = page.serve("photo.jpg");
    let mut rx = page.bus.subscribe();

    let el = page.loader.mount(LoaderProps::new(src.clone(), MediaKind::Image));
    // 350px below the fold.
    page.viewport.place(el.id(), VIEWPORT_HEIGHT + 350, 300);
    let_tasks_run().await;
    assert_eq!(el.state(), LoaderState::Observing);
    assert_eq!(page.net.hits(&src), 0);

    page.viewport.scroll_to(200);
    let_tasks_run().await;
    assert_eq!(el.state(), LoaderState::Observing);
    assert_eq!(page.net.hits(&src), 0);

    page.viewport.scroll_to(250);
    assert_eq!(settled(&el).await, LoaderState::Loaded);
    assert_eq!(page.net.hits(&src), 1);

    let events = drain(&mut rx);
    assert!(matches!(
        events[0],
        LoaderEvent::Observing { margin_px: 100, .. }
    ));
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn good_mobile_connection_loads_at_400px() {
    let page = Page::new(ConnectionProfile::mobile());
    let src = page.serve("photo.jpg");
    let mut rx = page.bus.subscribe();

    let el = page.loader.mount(LoaderProps::new(src.clone(), MediaKind::Image));
    page.viewport.place(el.id(), VIEWPORT_HEIGHT + 350, 300);

    assert_eq!(settled(&el).await, LoaderState::Loaded);
    assert_eq!(el.presentation(), Presentation::Final(src.clone()));
    assert_eq!(page.net.hits(&src), 1);

    let events = drain(&mut rx);
    assert!(matches!(
        events[0],
        LoaderEvent::Observing { margin_px: 400, .. }
    ));
    assert!(events.iter().any(
        |e| matches!(e, LoaderEvent::Loaded { element, url } if *element == el.id() && *url == src)
    ));
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn connection_is_sampled_per_mount() {
    let page = Page::new(ConnectionProfile::desktop());
    let src = page.serve("a.jpg");
    let mut rx = page.bus.subscribe();

    let first = page.loader.mount(LoaderProps::new(src.clone(), MediaKind::Image));
    page.connection
        .set(ConnectionProfile::desktop().with_save_data(true));
    let second = page.loader.mount(LoaderProps::new(src, MediaKind::Image));

    let margins: Vec<(u64, u32)> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            LoaderEvent::Observing { element, margin_px } => Some((element.get(), margin_px)),
            _ => None,
        })
        .collect();
    assert_eq!(
        margins,
        vec![(first.id().get(), 200), (second.id().get(), 100)]
    );
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn intersection_triggers_at_most_once() {
    let page = Page::new(ConnectionProfile::desktop());
    let src = page.serve("once.jpg");

    let el = page.loader.mount(LoaderProps::new(src.clone(), MediaKind::Image));
    page.viewport.place(el.id(), 100, 300);
    assert_eq!(settled(&el).await, LoaderState::Loaded);
    assert_eq!(page.viewport.active_observations(), 0);

    for scroll in [5_000, 0, 3_000, 50] {
        page.viewport.scroll_to(scroll);
    }
    let_tasks_run().await;

    assert_eq!(page.net.hits(&src), 1);
    assert_eq!(el.state(), LoaderState::Loaded);
}

#[rstest]
#[case::server_error(500)]
#[case::not_found(404)]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn failed_fetch_errors_without_retry(#[case] status: u16) {
    let page = Page::new(ConnectionProfile::desktop());
    let src = url("broken.jpg");
    page.net.route_status(&src, status, "nope");
    let mut rx = page.bus.subscribe();

    let el = page
        .loader
        .mount(LoaderProps::new(src.clone(), MediaKind::Image).with_eager(true));
    assert_eq!(settled(&el).await, LoaderState::Errored);
    assert_eq!(el.presentation(), Presentation::Failed);
    assert_eq!(
        Presentation::failure_label(MediaKind::Image),
        "Image failed to load"
    );

    page.viewport.place(el.id(), 0, 100);
    page.viewport.scroll_to(400);
    let_tasks_run().await;
    assert_eq!(page.net.hits(&src), 1);

    let failed: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, LoaderEvent::Failed { .. }))
        .collect();
    assert_eq!(failed.len(), 1);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn undecodable_image_is_errored() {
    let page = Page::new(ConnectionProfile::desktop());
    let src = url("garbage.jpg");
    page.net.route(&src, &b"definitely not an image"[..]);
    let mut rx = page.bus.subscribe();

    let el = page
        .loader
        .mount(LoaderProps::new(src.clone(), MediaKind::Image).with_eager(true));
    assert_eq!(settled(&el).await, LoaderState::Errored);

    let error = drain(&mut rx).into_iter().find_map(|e| match e {
        LoaderEvent::Failed { error, .. } => Some(error),
        _ => None,
    });
    assert!(error.unwrap().starts_with("decode failed"));
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn transport_failure_is_errored() {
    let page = Page::new(ConnectionProfile::desktop());
    let src = url("down.jpg");
    page.net.fail(&src, NetError::Timeout);

    let el = page
        .loader
        .mount(LoaderProps::new(src, MediaKind::Image).with_eager(true));
    assert_eq!(settled(&el).await, LoaderState::Errored);
    assert_eq!(el.presentation(), Presentation::Failed);
    assert_eq!(
        LoadError::from(NetError::Timeout).to_string(),
        format!("network error: {}", NetError::Timeout)
    );
}

/// Observer that goes away without ever reporting an intersection.
struct ClosedObserver;

impl ViewportObserver for ClosedObserver {
    fn observe(&self, element: ElementId, margin_px: u32) -> Observation {
        let (_tx, rx) = tokio::sync::oneshot::channel();
        Observation::new(element, margin_px, rx, || {})
    }
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn closed_observer_errors_the_element() {
    let net = MockNet::new();
    let src = url("never.jpg");
    net.route(&src, jpeg_fixture(32, 24));
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();
    let loader = ProgressiveLoader::new(
        Arc::new(NetMediaFetcher::new(net.clone())),
        Arc::new(ClosedObserver),
        Arc::new(StaticConnection::new(ConnectionProfile::desktop())),
    )
    .with_event_bus(bus);

    let el = loader.mount(LoaderProps::new(src.clone(), MediaKind::Image));
    assert_eq!(settled(&el).await, LoaderState::Errored);
    assert_eq!(el.presentation(), Presentation::Failed);
    assert_eq!(net.hits(&src), 0);
    assert!(drain(&mut rx).iter().any(
        |e| matches!(e, LoaderEvent::Failed { element, url, .. } if *element == el.id() && *url == src)
    ));
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn result_after_unmount_is_discarded() {
    let page = Page::new(ConnectionProfile::desktop());
    let src = page.serve("slow.jpg");
    page.net.delay(&src, Duration::from_millis(200));
    let mut rx = page.bus.subscribe();

    let el = page
        .loader
        .mount(LoaderProps::new(src.clone(), MediaKind::Image).with_eager(true));
    while page.net.hits(&src) == 0 {
        tokio::task::yield_now().await;
    }
    el.unmount();
    tokio::time::sleep(Duration::from_millis(400)).await;

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, LoaderEvent::Abandoned { .. })));
    assert!(!events.iter().any(|e| matches!(e, LoaderEvent::Loaded { .. })));
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn unmount_after_load_is_not_abandoned() {
    let page = Page::new(ConnectionProfile::desktop());
    let src = page.serve("done.jpg");
    let mut rx = page.bus.subscribe();

    let el = page
        .loader
        .mount(LoaderProps::new(src, MediaKind::Image).with_eager(true));
    assert_eq!(settled(&el).await, LoaderState::Loaded);
    el.unmount();

    let events = drain(&mut rx);
    assert!(!events.iter().any(|e| matches!(e, LoaderEvent::Abandoned { .. })));
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn priority_element_is_hinted_until_unmount() {
    let page = Page::new(ConnectionProfile::mobile());
    let src = page.serve("hero.jpg");

    let el = page
        .loader
        .mount(LoaderProps::new(src.clone(), MediaKind::Image).with_priority(true));

    let links = page.head.links();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].url, src);
    assert_eq!(links[0].kind, HintKind::Preload);
    assert_eq!(links[0].priority, FetchPriority::High);

    // Never placed in the viewport: priority skips observation.
    assert_eq!(settled(&el).await, LoaderState::Loaded);
    assert!(page.head.contains(&src, HintKind::Preload));

    el.unmount();
    assert!(page.head.is_empty());
}

#[rstest]
#[case::modern(ClientCapabilities::modern(), "hero.webp")]
#[case::baseline(ClientCapabilities::default(), "hero.jpg")]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn final_variant_follows_capabilities(
    #[case] caps: ClientCapabilities,
    #[case] expected: &str,
) {
    let page = Page::with_capabilities(ConnectionProfile::desktop(), caps);
    let webp = url("hero.webp");
    page.net.route(&webp, png_fixture(16, 16));
    page.serve("hero.jpg");
    let asset = MediaAsset::new(url("hero.png"), MediaKind::Image).with_variants(VariantSet {
        baseline: Some(url("hero.jpg")),
        modern: Some(webp),
        ..Default::default()
    });

    let el = page
        .loader
        .mount(LoaderProps::from_asset(&asset).with_eager(true));
    assert_eq!(settled(&el).await, LoaderState::Loaded);

    let requested: Vec<String> = page
        .net
        .requests()
        .into_iter()
        .map(|r| r.url.to_string())
        .collect();
    assert_eq!(requested, vec![url(expected).to_string()]);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn preview_is_replaced_by_final() {
    let page = Page::new(ConnectionProfile::desktop());
    let src = page.serve("big.jpg");
    let thumb = url("big_thumb.jpg");
    let asset = MediaAsset::new(src.clone(), MediaKind::Image).with_variants(VariantSet {
        thumbnail_baseline: Some(thumb.clone()),
        ..Default::default()
    });
    let mut rx = page.bus.subscribe();

    let el = page
        .loader
        .mount(LoaderProps::from_asset(&asset).with_preview(PreviewMode::Progressive));
    assert_eq!(el.presentation(), Presentation::Preview(thumb));

    page.viewport.place(el.id(), VIEWPORT_HEIGHT + 250, 300);
    assert_eq!(settled(&el).await, LoaderState::Loaded);
    assert_eq!(el.presentation(), Presentation::Final(src));

    assert!(matches!(
        drain(&mut rx)[0],
        LoaderEvent::Observing { margin_px: 300, .. }
    ));
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn immediate_preview_skips_observation() {
    let page = Page::new(ConnectionProfile::desktop());
    let src = page.serve("now.jpg");

    let el = page.loader.mount(
        LoaderProps::new(src.clone(), MediaKind::Image).with_preview(PreviewMode::Immediate),
    );
    assert_eq!(page.viewport.active_observations(), 0);
    assert_eq!(settled(&el).await, LoaderState::Loaded);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn video_is_fetched_without_decoding() {
    let page = Page::new(ConnectionProfile::desktop());
    let src = url("clip.mp4");
    page.net.route(&src, &b"\x00\x00\x00\x18ftypmp42"[..]);

    let el = page
        .loader
        .mount(LoaderProps::new(src.clone(), MediaKind::Video).with_eager(true));
    assert_eq!(settled(&el).await, LoaderState::Loaded);
    assert_eq!(page.net.requests()[0].destination, Destination::Video);
    assert!(page.head.is_empty());
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn siblings_are_independent() {
    let page = Page::new(ConnectionProfile::desktop());
    let good = page.serve("good.jpg");
    let bad = url("bad.jpg");
    page.net.route_status(&bad, 500, "");

    let ok = page
        .loader
        .mount(LoaderProps::new(good, MediaKind::Image).with_eager(true));
    let broken = page
        .loader
        .mount(LoaderProps::new(bad, MediaKind::Image).with_eager(true));

    assert_eq!(settled(&broken).await, LoaderState::Errored);
    assert_eq!(settled(&ok).await, LoaderState::Loaded);
}
