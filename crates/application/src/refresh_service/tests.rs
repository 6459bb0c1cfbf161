use std::sync::Arc;

use tagpulse_core::AppError;
use tagpulse_domain::{CountQuery, Granularity, SnapshotView};

use crate::test_support::{FakeCountingApi, FakeKeyValueStore, fixed_clock, fixed_now};
use crate::{
    CountService, FetchResponse, PipelineConfig, RefreshOutcome, RefreshService, SnapshotConfig,
    SnapshotStore,
};

fn refresh_service(
    api: Arc<FakeCountingApi>,
    kv: Arc<FakeKeyValueStore>,
    token: Option<&str>,
) -> (RefreshService, SnapshotStore) {
    let clock = fixed_clock();
    let count_service = CountService::new(
        api,
        clock.clone(),
        PipelineConfig::new(token.map(str::to_owned)),
    );
    let snapshot_store = SnapshotStore::new(
        kv,
        clock,
        SnapshotConfig::for_hashtag("#zec").unwrap_or_else(|_| unreachable!()),
    );
    let query =
        CountQuery::new("#zec", true, Granularity::Hour).unwrap_or_else(|_| unreachable!());

    (
        RefreshService::new(count_service, snapshot_store.clone(), query),
        snapshot_store,
    )
}

#[tokio::test]
async fn successful_refresh_persists_snapshot() {
    let (service, store) = refresh_service(
        Arc::new(FakeCountingApi::success(&[3, 5])),
        Arc::new(FakeKeyValueStore::default()),
        Some("token"),
    );

    let outcome = service.run().await;

    assert!(matches!(
        outcome,
        Ok(RefreshOutcome::Persisted { total: 8, .. })
    ));
    let view = store.read_latest_with_history().await;
    assert!(view.is_ok_and(|view| view.is_ready()));
}

#[tokio::test]
async fn throttled_refresh_leaves_previous_snapshot_untouched() {
    let kv = Arc::new(FakeKeyValueStore::default());
    let (first, store) = refresh_service(
        Arc::new(FakeCountingApi::success(&[4])),
        kv.clone(),
        Some("token"),
    );
    assert!(first.run().await.is_ok());

    let (second, _) = refresh_service(
        Arc::new(FakeCountingApi::throttled(Some(fixed_now().timestamp() + 60))),
        kv,
        Some("token"),
    );
    let outcome = second.run().await;

    let Ok(RefreshOutcome::SkippedThrottled { retry, .. }) = outcome else {
        panic!("expected throttled refresh");
    };
    assert_eq!(retry.retry_after_seconds, 60);

    let Ok(SnapshotView::Ready { latest, history }) = store.read_latest_with_history().await
    else {
        panic!("expected previous snapshot to survive");
    };
    assert_eq!(latest.total, Some(4));
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn upstream_error_does_not_touch_snapshot() {
    let kv = Arc::new(FakeKeyValueStore::default());
    let (service, store) = refresh_service(
        Arc::new(FakeCountingApi::new(FetchResponse::transport_failure(
            "dns lookup failed",
        ))),
        kv,
        Some("token"),
    );

    let outcome = service.run().await;

    assert!(matches!(outcome, Ok(RefreshOutcome::UpstreamError(_))));
    assert!(matches!(
        store.read_latest_with_history().await,
        Ok(SnapshotView::NotReady)
    ));
}

#[tokio::test]
async fn missing_credential_is_reported_without_fetching() {
    let api = Arc::new(FakeCountingApi::success(&[1]));
    let (service, _) = refresh_service(api.clone(), Arc::new(FakeKeyValueStore::default()), None);

    let outcome = service.run().await;

    assert!(matches!(outcome, Ok(RefreshOutcome::ConfigError(_))));
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn store_failure_surfaces_as_internal_error() {
    let (service, _) = refresh_service(
        Arc::new(FakeCountingApi::success(&[1])),
        Arc::new(FakeKeyValueStore::failing()),
        Some("token"),
    );

    let outcome = service.run().await;

    assert!(matches!(outcome, Err(AppError::Internal(_))));
}
