use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::auth::Gate;

use super::error::ApiError;
use super::state::ApiState;

pub async fn require_authenticated(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    guard(&state, Gate::Authenticated, request, next).await
}

pub async fn require_moderator(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    guard(&state, Gate::Moderator, request, next).await
}

async fn guard(state: &ApiState, gate: Gate, mut request: Request<Body>, next: Next) -> Response {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match state.access.authorize(header, gate) {
        Ok(token) => token,
        Err(err) => return ApiError::from(err).into_response(),
    };

    request.extensions_mut().insert(token.clone());
    let mut response = next.run(request).await;
    // Lets the response logger record the caller's role.
    response.extensions_mut().insert(token);
    response
}
