//! Token issuing handlers.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::IntoResponse;

use crate::application::accounts::{LoginCommand, RegisterCommand};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

use super::{json_to_api, query_to_api};

pub async fn dummy_login(
    State(state): State<ApiState>,
    query: Result<Query<DummyLoginQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(query_to_api)?;
    let issued = state.accounts.dummy_login(query.user_type)?;
    Ok(Json(TokenResponse {
        token: issued.token,
    }))
}

pub async fn register(
    State(state): State<ApiState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_to_api)?;
    let user_id = state
        .accounts
        .register(RegisterCommand {
            email: payload.email,
            password: payload.password,
            role: payload.user_type,
        })
        .await?;
    Ok(Json(RegisterResponse { user_id }))
}

pub async fn login(
    State(state): State<ApiState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_to_api)?;
    let issued = state
        .accounts
        .login(LoginCommand {
            id: payload.id,
            password: payload.password,
        })
        .await?;
    Ok(Json(TokenResponse {
        token: issued.token,
    }))
}
