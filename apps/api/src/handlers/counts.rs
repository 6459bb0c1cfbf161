use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tagpulse_application::{CountInput, CountOutcome, UpstreamFailure};
use tagpulse_core::AppError;
use tagpulse_domain::Granularity;

use crate::dto::{CountParams, ErrorResponse, ThrottledCountResponse, UpstreamErrorResponse};
use crate::error::ApiResult;
use crate::state::AppState;


const THROTTLED_NOTE: &str = "Rate-limited by X; retry after reset.";
const UPSTREAM_ERROR: &str = "X API error";
const NO_STORE: &str = "no-store";

/// On-demand count of the last 24 hours for a caller-supplied query.
pub async fn count_handler(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> ApiResult<Response> {
    let input = count_input_from_params(params)?;
    let outcome = state.count_service.count(input).await?;

    let response = match outcome {
        CountOutcome::Counted(result) => (
            StatusCode::OK,
            [(header::CACHE_CONTROL, state.on_demand_cache.cache_control())],
            Json(result),
        )
            .into_response(),
        CountOutcome::Throttled { result, retry } => (
            StatusCode::OK,
            [
                (
                    header::CACHE_CONTROL,
                    state.on_demand_cache.throttled_cache_control(&retry),
                ),
                (header::RETRY_AFTER, retry.retry_after_seconds.to_string()),
            ],
            Json(ThrottledCountResponse {
                result,
                note: THROTTLED_NOTE,
                retry_after_ms: retry.retry_after_ms(),
                retry,
            }),
        )
            .into_response(),
        CountOutcome::UpstreamError(failure) => upstream_error_response(failure),
    };

    Ok(response)
}

fn count_input_from_params(params: CountParams) -> Result<CountInput, AppError> {
    let granularity = params
        .granularity
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(Granularity::parse_transport)
        .transpose()?;

    // Only an explicit opt-out excludes retweets.
    let include_retweets = params
        .retweets
        .as_deref()
        .map(|value| !matches!(value.trim(), "0" | "false"));

    Ok(CountInput {
        query: params.q,
        granularity,
        include_retweets,
    })
}

fn upstream_error_response(failure: UpstreamFailure) -> Response {
    let Some(status) = failure.status else {
        return (
            StatusCode::BAD_GATEWAY,
            [(header::CACHE_CONTROL, NO_STORE)],
            Json(ErrorResponse::new(format!(
                "upstream unreachable: {}",
                failure.body
            ))),
        )
            .into_response();
    };

    let http_status = StatusCode::from_u16(status)
        .ok()
        .filter(|code| code.is_client_error() || code.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY);

    (
        http_status,
        [(header::CACHE_CONTROL, NO_STORE)],
        Json(UpstreamErrorResponse {
            error: UPSTREAM_ERROR,
            status: Some(status),
            body: failure.body,
            rate_limit: failure.rate_limit,
        }),
    )
        .into_response()
}
