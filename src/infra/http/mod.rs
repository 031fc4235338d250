pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};
pub use middleware::{REQUEST_ID_HEADER, RequestContext};

use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;

use middleware::{log_responses, request_timeout, set_request_context};

pub(crate) const METRIC_HTTP_REQUEST_MS: &str = "listings_http_request_ms";

/// Full service router with request ids, response logging and the request deadline.
pub fn build_router(state: ApiState, request_timeout_limit: Duration) -> Router {
    build_api_router(state)
        .layer(axum_middleware::from_fn_with_state(
            request_timeout_limit,
            request_timeout,
        ))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
