use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tagpulse_domain::SnapshotView;

use crate::dto::{SnapshotPendingResponse, SnapshotReadyResponse};
use crate::error::ApiResult;
use crate::state::AppState;


const PENDING_NOTE: &str = "No data cached yet. Wait for the cron to run.";

/// Read path: serves the persisted snapshot and never calls the upstream.
pub async fn snapshot_handler(State(state): State<AppState>) -> ApiResult<Response> {
    let view = state.snapshot_store.read_latest_with_history().await?;
    let cache_control = [(header::CACHE_CONTROL, state.snapshot_cache.cache_control())];

    let response = match view {
        SnapshotView::NotReady => (
            StatusCode::OK,
            cache_control,
            Json(SnapshotPendingResponse {
                ready: false,
                note: PENDING_NOTE,
            }),
        )
            .into_response(),
        SnapshotView::Ready { latest, history } => (
            StatusCode::OK,
            cache_control,
            Json(SnapshotReadyResponse {
                ready: true,
                hashtag: latest.query.clone(),
                latest: *latest,
                history,
            }),
        )
            .into_response(),
    };

    Ok(response)
}
