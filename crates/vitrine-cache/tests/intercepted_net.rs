use std::{sync::Arc, time::Duration};

use rstest::*;
use url::Url;
use vitrine_cache::{CacheController, CacheManifest, InterceptedNet, MemCacheStorage};
use vitrine_net::{Destination, Net, NetError, Request};
use vitrine_test_utils::MockNet;

const ORIGIN: &str = "https://app.test/";

fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

fn controller(net: &MockNet) -> Arc<CacheController<MockNet, MemCacheStorage>> {
    let manifest = CacheManifest::default()
        .with_origin(Url::parse(ORIGIN).unwrap())
        .with_precache(["/"]);
    Arc::new(CacheController::new(
        manifest,
        net.clone(),
        MemCacheStorage::new(),
    ))
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn reads_through_the_cache() {
    let net = MockNet::new();
    net.route(&url("/"), "<html/>")
        .route(&url("/photo.jpg"), "jpeg");
    let controller = controller(&net);
    controller.install().await.unwrap();
    controller.activate().await.unwrap();
    let intercepted = InterceptedNet::new(Arc::clone(&controller));

    let online = intercepted
        .get_bytes(url("/photo.jpg"), Destination::Image)
        .await
        .unwrap();
    assert_eq!(&online[..], b"jpeg");

    net.set_offline(true);
    let offline = intercepted
        .get_bytes(url("/photo.jpg"), Destination::Image)
        .await
        .unwrap();
    assert_eq!(&offline[..], b"jpeg");
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn passes_through_before_activation_and_cross_origin() {
    let net = MockNet::new();
    let cdn = Url::parse("https://cdn.other.test/a.jpg").unwrap();
    net.route(&cdn, "remote").route(&url("/x"), "local");
    let intercepted = InterceptedNet::new(controller(&net));

    let resp = intercepted.fetch(Request::get(url("/x"))).await.unwrap();
    assert_eq!(&resp.body[..], b"local");
    let resp = intercepted.fetch(Request::get(cdn.clone())).await.unwrap();
    assert_eq!(&resp.body[..], b"remote");
    assert!(intercepted.controller().cached(&url("/x")).await.is_none());
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn rejection_surfaces_the_network_error() {
    let net = MockNet::new();
    net.route(&url("/"), "<html/>");
    let controller = controller(&net);
    controller.install().await.unwrap();
    controller.activate().await.unwrap();
    net.fail(&url("/api/items"), NetError::Timeout);

    let err = InterceptedNet::new(controller)
        .fetch(Request::get(url("/api/items")))
        .await
        .unwrap_err();
    assert_eq!(err, NetError::Timeout);
}
