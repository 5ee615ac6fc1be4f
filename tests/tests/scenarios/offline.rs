use std::time::Duration;

use rstest::*;
use tempfile::TempDir;
use vitrine::{
    cache::{DiskCacheStorage, MemCacheStorage, Phase},
    core::MediaKind,
    events::{CacheEvent, Event, LoaderEvent, ServedFrom},
    loader::{LoaderProps, LoaderState, Presentation},
    net::{Destination, Net, Request},
};
use vitrine_test_utils::{MockNet, jpeg_fixture};

use crate::common::{Site, settled, shell_net, temp_dir, url};

fn gallery_net() -> MockNet {
    let net = shell_net();
    net.route(&url("/photos/1.jpg"), jpeg_fixture(64, 48))
        .route(&url("/photos/2.jpg"), jpeg_fixture(64, 48))
        .route(&url("/gallery/42"), "<html>gallery 42</html>");
    net
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn viewed_images_survive_going_offline() {
    let net = gallery_net();
    let site = Site::open(&net, MemCacheStorage::new(), "v1").await;
    let mut rx = site.bus.subscribe();

    let props = LoaderProps::new(url("/photos/1.jpg"), MediaKind::Image).with_eager(true);
    let online = site.loader.mount(props.clone());
    assert_eq!(settled(&online).await, LoaderState::Loaded);
    online.unmount();

    net.set_offline(true);
    let offline = site.loader.mount(props);
    assert_eq!(settled(&offline).await, LoaderState::Loaded);

    let mut sources = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Cache(CacheEvent::Served { from, .. }) = event {
            sources.push(from);
        }
    }
    assert_eq!(sources, vec![ServedFrom::Network, ServedFrom::Cache]);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn unseen_image_fails_offline_but_navigation_gets_the_shell() {
    let net = gallery_net();
    let site = Site::open(&net, MemCacheStorage::new(), "v1").await;
    let mut rx = site.bus.subscribe();
    net.set_offline(true);

    let el = site.loader.mount(
        LoaderProps::new(url("/photos/2.jpg"), MediaKind::Image).with_eager(true),
    );
    assert_eq!(settled(&el).await, LoaderState::Errored);
    assert_eq!(el.presentation(), Presentation::Failed);

    let failed = std::iter::from_fn(|| rx.try_recv().ok()).any(|e| {
        matches!(e, Event::Loader(LoaderEvent::Failed { element, .. }) if element == el.id())
    });
    assert!(failed);

    let page = vitrine::cache::InterceptedNet::new(site.controller.clone())
        .fetch(Request::get(url("/gallery/42")).with_destination(Destination::Document))
        .await
        .unwrap();
    assert_eq!(&page.body[..], b"<html>gallery shell</html>");
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn disk_cache_serves_after_restart(temp_dir: TempDir) {
    let net = gallery_net();
    let props = LoaderProps::new(url("/photos/1.jpg"), MediaKind::Image).with_eager(true);

    {
        let storage = DiskCacheStorage::open_root(temp_dir.path()).unwrap();
        let site = Site::open(&net, storage, "v1").await;
        let el = site.loader.mount(props.clone());
        assert_eq!(settled(&el).await, LoaderState::Loaded);
    }

    let storage = DiskCacheStorage::open_root(temp_dir.path()).unwrap();
    let site = Site::open(&net, storage, "v1").await;
    net.set_offline(true);

    let el = site.loader.mount(props);
    assert_eq!(settled(&el).await, LoaderState::Loaded);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn version_bump_drops_old_media(temp_dir: TempDir) {
    let net = gallery_net();
    let props = LoaderProps::new(url("/photos/1.jpg"), MediaKind::Image).with_eager(true);

    {
        let storage = DiskCacheStorage::open_root(temp_dir.path()).unwrap();
        let site = Site::open(&net, storage, "v1").await;
        let el = site.loader.mount(props.clone());
        assert_eq!(settled(&el).await, LoaderState::Loaded);
    }

    let storage = DiskCacheStorage::open_root(temp_dir.path()).unwrap();
    let site = Site::open(&net, storage, "v2").await;
    assert_eq!(site.controller.phase(), Phase::Activated);
    assert!(
        site.controller
            .cached(&url("/photos/1.jpg"))
            .await
            .is_none()
    );
    assert!(site.controller.cached(&url("/")).await.is_some());

    net.set_offline(true);
    let el = site.loader.mount(props);
    assert_eq!(settled(&el).await, LoaderState::Errored);
}
