//! HTTP adapter for the recent post counts endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use tagpulse_application::{CountRequest, CountingApi, FetchOutcome, FetchResponse};
use tagpulse_core::{AppError, AppResult};
use tagpulse_domain::{
    RATE_LIMIT_LIMIT_HEADER, RATE_LIMIT_REMAINING_HEADER, RATE_LIMIT_RESET_HEADER, RateLimitInfo,
    RawCounts,
};
use tracing::warn;
use url::Url;

/// Default upstream API origin.
pub const DEFAULT_COUNTING_API_BASE_URL: &str = "https://api.x.com";

const RECENT_COUNTS_PATH: &str = "/2/tweets/counts/recent";

/// reqwest implementation of the counting API port.
#[derive(Clone)]
pub struct HttpCountingApi {
    http_client: reqwest::Client,
    endpoint: Url,
}

impl HttpCountingApi {
    /// Creates an adapter targeting `{base_url}/2/tweets/counts/recent`.
    pub fn new(http_client: reqwest::Client, base_url: &str) -> AppResult<Self> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join(RECENT_COUNTS_PATH))
            .map_err(|error| {
                AppError::Config(format!("invalid counting API base url '{base_url}': {error}"))
            })?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    /// Returns the fully qualified counting endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self, request: &CountRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .extend_pairs(request.query.request_params(&request.window));
        url
    }
}

#[async_trait]
impl CountingApi for HttpCountingApi {
    async fn fetch_counts(
        &self,
        request: &CountRequest,
        bearer_token: &str,
    ) -> AppResult<FetchResponse> {
        let response = match self
            .http_client
            .get(self.request_url(request))
            .bearer_auth(bearer_token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                return Ok(FetchResponse::transport_failure(format!(
                    "counting request transport error: {error}"
                )));
            }
        };

        let rate_limit = rate_limit_from_headers(response.headers());
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(FetchResponse {
                rate_limit,
                outcome: FetchOutcome::Throttled,
            });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(error) => {
                return Ok(FetchResponse {
                    rate_limit,
                    outcome: FetchOutcome::UpstreamError {
                        status: Some(status.as_u16()),
                        body: format!("failed to read counting response body: {error}"),
                    },
                });
            }
        };

        if !status.is_success() {
            return Ok(FetchResponse {
                rate_limit,
                outcome: FetchOutcome::UpstreamError {
                    status: Some(status.as_u16()),
                    body,
                },
            });
        }

        let outcome = match serde_json::from_str::<RawCounts>(body.as_str()) {
            Ok(raw) => FetchOutcome::Success(raw),
            Err(error) => {
                warn!(status = status.as_u16(), error = %error, "malformed counting response body");
                FetchOutcome::UpstreamError {
                    status: Some(status.as_u16()),
                    body,
                }
            }
        };

        Ok(FetchResponse {
            rate_limit,
            outcome,
        })
    }
}

fn rate_limit_from_headers(headers: &HeaderMap) -> RateLimitInfo {
    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

    RateLimitInfo::from_header_values(
        header(RATE_LIMIT_REMAINING_HEADER),
        header(RATE_LIMIT_LIMIT_HEADER),
        header(RATE_LIMIT_RESET_HEADER),
    )
}
