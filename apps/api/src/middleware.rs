use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use tagpulse_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Rejects scheduled-trigger calls that lack the configured bearer secret.
///
/// Open when no secret is configured.
pub async fn require_cron_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if !cron_secret_matches(state.cron_secret.as_deref(), authorization) {
        return Err(AppError::Unauthorized("invalid cron secret".to_owned()).into());
    }

    Ok(next.run(request).await)
}

fn cron_secret_matches(expected: Option<&str>, authorization: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };

    authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|presented| presented == expected)
}
