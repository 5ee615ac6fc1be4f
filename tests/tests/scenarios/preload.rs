use std::{sync::Arc, time::Duration};

use rstest::*;
use vitrine::{
    cache::{InterceptedNet, MemCacheStorage},
    core::{ConnectionProfile, MediaKind},
    loader::{LoaderProps, LoaderState},
    preload::{FetchPriority, HintKind, PreloadOptions, PreloadScheduler, warm_critical},
};
use vitrine_test_utils::jpeg_fixture;

use crate::common::{Site, settled, shell_net, url};

fn fast_options() -> PreloadOptions {
    PreloadOptions {
        deferred_delay: Duration::from_millis(20),
        warm_delay_mobile: Duration::from_millis(10),
        warm_delay_desktop: Duration::from_millis(10),
        ..PreloadOptions::default()
    }
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn gallery_hints_share_the_head_with_the_hero() {
    let net = shell_net();
    let hero = url("/photos/hero.jpg");
    net.route(&hero, jpeg_fixture(64, 48));
    let site = Site::open(&net, MemCacheStorage::new(), "v1").await;

    let scheduler = PreloadScheduler::with_options(site.head.clone(), fast_options());
    let thumbs: Vec<_> = (0..8)
        .map(|i| url(&format!("/photos/{i}_thumb.jpg")))
        .collect();
    let scheduled = scheduler.schedule(thumbs.clone());
    assert_eq!(site.head.len(), 6);

    let el = site
        .loader
        .mount(LoaderProps::new(hero.clone(), MediaKind::Image).with_priority(true));
    assert_eq!(settled(&el).await, LoaderState::Loaded);
    assert_eq!(scheduled.finished().await, 2);

    let links = site.head.links();
    assert_eq!(links.len(), 9);
    let hero_hint = links.iter().find(|h| h.url == hero).unwrap();
    assert_eq!(hero_hint.priority, FetchPriority::High);
    assert!(site.head.contains(&thumbs[7], HintKind::Prefetch));

    el.unmount();
    assert_eq!(site.head.len(), 8);
    assert!(!site.head.contains(&hero, HintKind::Preload));
    // Hints never fetch anything themselves.
    for thumb in &thumbs {
        assert_eq!(net.hits(thumb), 0);
    }
}

#[rstest]
#[case::good(ConnectionProfile::mobile(), 2)]
#[case::save_data(ConnectionProfile::mobile().with_save_data(true), 0)]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn warm_up_fills_the_cache_on_good_connections(
    #[case] profile: ConnectionProfile,
    #[case] expected: usize,
) {
    let net = shell_net();
    let critical = [url("/photos/a.jpg"), url("/photos/b.jpg")];
    for u in &critical {
        net.route(u, jpeg_fixture(16, 16));
    }
    let site = Site::open(&net, MemCacheStorage::new(), "v1").await;
    let intercepted = InterceptedNet::new(Arc::clone(&site.controller));

    let report = warm_critical(&intercepted, &critical, &profile, &fast_options()).await;
    assert_eq!(report.fetched, expected);

    let cached = cached_count(&site, &critical).await;
    assert_eq!(cached, expected);
}

async fn cached_count(site: &Site<MemCacheStorage>, urls: &[url::Url]) -> usize {
    let mut n = 0;
    for u in urls {
        if site.controller.cached(u).await.is_some() {
            n += 1;
        }
    }
    n
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn route_prefetches_are_documents() {
    let net = shell_net();
    let site = Site::open(&net, MemCacheStorage::new(), "v1").await;
    let scheduler = PreloadScheduler::new(site.head.clone());

    let announced = scheduler.prefetch_routes(&url("/"), ["/about", "/gallery"]);
    assert_eq!(announced, 2);
    assert!(site.head.render().contains(r#"as="document""#));
}
