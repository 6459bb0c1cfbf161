use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tagpulse_application::RefreshOutcome;
use tracing::{info, warn};

use crate::dto::{ErrorResponse, RefreshResponse, UpstreamErrorResponse};
use crate::error::ApiResult;
use crate::state::AppState;


/// Scheduled trigger: runs one refresh of the configured hashtag.
pub async fn refresh_snapshot_handler(State(state): State<AppState>) -> ApiResult<Response> {
    let outcome = state.refresh_service.run().await?;

    let response = match outcome {
        RefreshOutcome::Persisted { total, rate_limit } => {
            info!(total, "cron refresh persisted snapshot");
            Json(RefreshResponse {
                ok: true,
                total: Some(total),
                skipped: None,
                retry: None,
                rate: rate_limit,
            })
            .into_response()
        }
        RefreshOutcome::SkippedThrottled { rate_limit, retry } => {
            info!(
                retry_after_seconds = retry.retry_after_seconds,
                "cron refresh skipped: rate limited"
            );
            Json(RefreshResponse {
                ok: true,
                total: None,
                skipped: Some("rate_limited"),
                retry: Some(retry),
                rate: rate_limit,
            })
            .into_response()
        }
        RefreshOutcome::UpstreamError(failure) => {
            warn!(status = ?failure.status, "cron refresh failed upstream");
            let http_status = failure
                .status
                .and_then(|status| StatusCode::from_u16(status).ok())
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY);

            (
                http_status,
                Json(UpstreamErrorResponse {
                    error: "X API error",
                    status: failure.status,
                    body: failure.body,
                    rate_limit: failure.rate_limit,
                }),
            )
                .into_response()
        }
        RefreshOutcome::ConfigError(message) => {
            warn!(%message, "cron refresh not configured");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(message)),
            )
                .into_response()
        }
    };

    Ok(response)
}
