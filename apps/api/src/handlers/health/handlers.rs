use super::checks::check_snapshot_store;
use super::*;

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let snapshot_store = check_snapshot_store(state.redis_client.clone()).await;

    let ready = is_ready(snapshot_store.status);
    let status = if ready { "ok" } else { "degraded" };
    let http_status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(HealthResponse {
            status,
            ready,
            snapshot_store,
            corrupt_snapshot_entries: state.snapshot_store.corrupt_entry_count(),
        }),
    )
}

fn is_ready(snapshot_store_status: &str) -> bool {
    matches!(snapshot_store_status, "ok" | "disabled")
}
