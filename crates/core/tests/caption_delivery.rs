//! Caption delivery integration tests.
//!
//! The delivery flow is independent from lookup: request → caption cache →
//! archive store → extraction → transcoding. Failures surface with a
//! classified error instead of collapsing to empty.

use std::sync::Arc;

use subfetch_core::config::{CacheConfig, CatalogConfig, Config, DeliveryConfig, QueueConfig};
use subfetch_core::testing::{fixtures, MockCatalog};
use subfetch_core::{
    CaptionError, CaptionRequest, CatalogError, FetchCoordinator, QueueRegistry, SubtitleRequest,
};

struct TestHarness {
    coordinator: FetchCoordinator,
    catalog: Arc<MockCatalog>,
    cache: CacheConfig,
}

impl TestHarness {
    fn new() -> Self {
        let cache = CacheConfig::default();
        let config = Config {
            catalog: CatalogConfig {
                base_url: "https://catalog.example".to_string(),
                ..CatalogConfig::default()
            },
            queue: QueueConfig::default(),
            cache: cache.clone(),
            delivery: DeliveryConfig {
                base_url: "https://subs.example".to_string(),
            },
        };
        let queues = Arc::new(QueueRegistry::new(config.queue.clone()));
        let catalog = Arc::new(MockCatalog::new());
        let coordinator = FetchCoordinator::new(config, Arc::clone(&catalog) as Arc<dyn subfetch_core::CatalogClient>, queues);
        Self {
            coordinator,
            catalog,
            cache,
        }
    }

    fn caption_request(&self, archive_id: &str, entry_path: &str) -> CaptionRequest {
        CaptionRequest {
            credential: "key".to_string(),
            archive_id: archive_id.to_string(),
            entry_path: entry_path.to_string(),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_caption_delivery_end_to_end() {
    let harness = TestHarness::new();
    harness
        .catalog
        .set_archive(
            "sub-1",
            fixtures::zip_fixture(&[(
                "Show.S02E05.srt",
                fixtures::srt_fixture("first line").as_slice(),
            )]),
        )
        .await;

    let payload = harness
        .coordinator
        .caption(harness.caption_request("sub-1", "Show.S02E05.srt"))
        .await
        .unwrap();

    assert!(payload.text.starts_with("WEBVTT\n\n"));
    assert!(payload.text.contains("00:01:02.345 --> 00:01:04.000"));
    assert!(payload.text.contains("first line"));
    assert_eq!(payload.content_type, "text/vtt;charset=utf-8");
    assert_eq!(
        payload.cache_control,
        format!("public, max-age={}", harness.cache.caption_ttl_secs)
    );
}

#[tokio::test(start_paused = true)]
async fn test_caption_cache_avoids_second_download() {
    let harness = TestHarness::new();
    harness
        .catalog
        .set_archive(
            "sub-1",
            fixtures::zip_fixture(&[(
                "a.srt",
                fixtures::srt_fixture("cached").as_slice(),
            )]),
        )
        .await;

    let first = harness
        .coordinator
        .caption(harness.caption_request("sub-1", "a.srt"))
        .await
        .unwrap();
    let second = harness
        .coordinator
        .caption(harness.caption_request("sub-1", "a.srt"))
        .await
        .unwrap();

    assert_eq!(first.text, second.text);
    assert_eq!(harness.catalog.download_call_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_lookup_and_delivery_share_the_archive_store() {
    let harness = TestHarness::new();
    harness
        .catalog
        .set_entries(vec![fixtures::catalog_entry("sub-1", "rum", "Show S02E05")])
        .await;
    harness
        .catalog
        .set_archive(
            "sub-1",
            fixtures::zip_fixture(&[(
                "Show.S02E05.srt",
                fixtures::srt_fixture("shared bytes").as_slice(),
            )]),
        )
        .await;

    let request = SubtitleRequest {
        credential: "key".to_string(),
        imdb_id: "tt1".to_string(),
        season: Some(2),
        episode: Some(5),
        video_filename: None,
        languages: Vec::new(),
    };
    let tracks = harness.coordinator.lookup(request).await;
    assert_eq!(tracks.len(), 1);
    assert_eq!(harness.catalog.download_call_count().await, 1);

    // Delivery reuses the bytes the lookup already fetched.
    let payload = harness
        .coordinator
        .caption(harness.caption_request("sub-1", "Show.S02E05.srt"))
        .await
        .unwrap();
    assert!(payload.text.contains("shared bytes"));
    assert_eq!(harness.catalog.download_call_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_entry_is_not_found() {
    let harness = TestHarness::new();
    harness
        .catalog
        .set_archive(
            "sub-1",
            fixtures::zip_fixture(&[("a.srt", fixtures::srt_fixture("x").as_slice())]),
        )
        .await;

    let err = harness
        .coordinator
        .caption(harness.caption_request("sub-1", "missing.srt"))
        .await
        .unwrap_err();
    assert!(matches!(err, CaptionError::NotFound(_)), "got {err:?}");
}

#[tokio::test(start_paused = true)]
async fn test_missing_archive_is_not_found() {
    let harness = TestHarness::new();
    let err = harness
        .coordinator
        .caption(harness.caption_request("sub-unknown", "a.srt"))
        .await
        .unwrap_err();
    assert!(matches!(err, CaptionError::NotFound(_)), "got {err:?}");
}

#[tokio::test(start_paused = true)]
async fn test_upstream_failures_map_to_statuses() {
    let harness = TestHarness::new();

    harness.catalog.fail_next_download(CatalogError::Auth).await;
    let err = harness
        .coordinator
        .caption(harness.caption_request("sub-1", "a.srt"))
        .await
        .unwrap_err();
    assert!(matches!(err, CaptionError::Unauthorized), "got {err:?}");

    harness
        .catalog
        .fail_next_download(CatalogError::QuotaExceeded)
        .await;
    let err = harness
        .coordinator
        .caption(harness.caption_request("sub-2", "a.srt"))
        .await
        .unwrap_err();
    assert!(matches!(err, CaptionError::TooManyRequests), "got {err:?}");

    harness
        .catalog
        .fail_next_download(CatalogError::Transient("reset".into()))
        .await;
    let err = harness
        .coordinator
        .caption(harness.caption_request("sub-3", "a.srt"))
        .await
        .unwrap_err();
    assert!(matches!(err, CaptionError::Internal(_)), "got {err:?}");
}

#[tokio::test(start_paused = true)]
async fn test_validate_credential() {
    let harness = TestHarness::new();

    harness.catalog.set_quota(Ok(42)).await;
    assert!(harness.coordinator.validate_credential("key").await);

    harness.catalog.set_quota(Err(())).await;
    assert!(!harness.coordinator.validate_credential("key").await);
}
