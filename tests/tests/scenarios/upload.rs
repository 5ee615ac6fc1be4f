use std::time::Duration;

use bytes::Bytes;
use rstest::*;
use vitrine::{
    cache::MemCacheStorage,
    core::VariantKind,
    loader::{LoaderProps, LoaderState, Presentation, PreviewMode},
    transcode::{
        MemObjectStore, OutputFormat, TranscodeError, TranscodeOptions, Transcoder, publish_as,
    },
};
use vitrine_test_utils::jpeg_fixture;

use crate::common::{Site, settled, shell_net, tracing_setup, url};

#[rstest]
#[timeout(Duration::from_secs(30))]
#[tokio::test(flavor = "multi_thread")]
async fn upload_is_transcoded_published_and_displayed(#[from(tracing_setup)] _tracing: ()) {
    let net = shell_net();
    let site = Site::open(&net, MemCacheStorage::new(), "v1").await;

    let variants = Transcoder::new()
        .transcode(
            Bytes::from(jpeg_fixture(1600, 1200)),
            &TranscodeOptions::default(),
        )
        .await
        .unwrap();
    let baseline = variants.get(VariantKind::Baseline);
    assert_eq!((baseline.width, baseline.height), (1440, 1080));
    assert_eq!(variants.get(VariantKind::ThumbnailModern).format, OutputFormat::WebP);

    let store = MemObjectStore::new(url("/media/"));
    let asset = publish_as(&variants, &store, "cat").await.unwrap();
    assert_eq!(store.len(), 4);
    // The bucket is served from the page origin.
    for (kind, variant) in variants.iter() {
        net.route(asset.variants().get(kind).unwrap(), variant.bytes.clone());
    }

    let el = site
        .loader
        .mount(LoaderProps::from_asset(&asset).with_preview(PreviewMode::Progressive));
    assert_eq!(
        el.presentation(),
        Presentation::Preview(url("/media/cat_thumb.webp"))
    );

    site.viewport.place(el.id(), 0, 300);
    assert_eq!(settled(&el).await, LoaderState::Loaded);
    assert_eq!(el.presentation(), Presentation::Final(url("/media/cat.webp")));
    assert_eq!(net.hits(&url("/media/cat.webp")), 1);
    assert_eq!(net.hits(&url("/media/cat.jpg")), 0);
}

#[rstest]
#[timeout(Duration::from_secs(30))]
#[tokio::test(flavor = "multi_thread")]
async fn corrupt_upload_is_rejected_before_publishing() {
    let mut truncated = jpeg_fixture(640, 480);
    truncated.truncate(20);

    let err = Transcoder::new()
        .transcode(Bytes::from(truncated), &TranscodeOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TranscodeError::Decode(_)));
}
