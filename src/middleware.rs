use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::metrics::{RATE_LIMITED_TOTAL, REQUEST_LATENCY, REQUEST_TOTAL};
use crate::rate_limit::{Decision, identify_client, reset_epoch_secs};
use crate::state::AppState;

const LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

// paths outside the configured prefixes pass straight through
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let limiter = &state.rate_limiter;
    if !limiter.config().applies_to(request.uri().path()) {
        return next.run(request).await;
    }

    REQUEST_TOTAL.inc();
    let client_key = identify_client(request.headers());

    let admission = match limiter.check(&client_key, Utc::now()) {
        Decision::Rejected(rejection) => {
            RATE_LIMITED_TOTAL.inc();
            warn!(
                client = %client_key,
                retry_after = rejection.retry_after_secs,
                "Rate limit exceeded"
            );
            return ApiError::RateLimited(rejection).into_response();
        }
        Decision::Unidentified => {
            debug!(path = request.uri().path(), "No client address, skipping rate limit");
            None
        }
        Decision::Allowed(admission) => Some(admission),
    };

    let start_time = Instant::now();
    let mut response = next.run(request).await;
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    if let Some(admission) = admission {
        if limiter.config().emit_headers {
            insert_rate_limit_headers(
                response.headers_mut(),
                admission.limit,
                admission.remaining(),
                admission.reset_at,
            );
        }
    }
    response
}

pub(crate) fn insert_rate_limit_headers(
    headers: &mut HeaderMap,
    limit: u32,
    remaining: u32,
    reset_at: DateTime<Utc>,
) {
    headers.insert(LIMIT, limit.into());
    headers.insert(REMAINING, remaining.into());
    headers.insert(RESET, reset_epoch_secs(reset_at).into());
}
