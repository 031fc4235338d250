//! Flat handlers

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;

use crate::application::catalog::{CreateFlatCommand, ModerateFlatCommand};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

use super::json_to_api;

pub async fn create_flat(
    State(state): State<ApiState>,
    payload: Result<Json<FlatCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_to_api)?;
    let flat = state
        .catalog
        .create_flat(CreateFlatCommand {
            house_id: payload.house_id,
            price: payload.price,
            rooms: payload.rooms,
        })
        .await?;
    Ok(Json(flat))
}

pub async fn update_flat(
    State(state): State<ApiState>,
    payload: Result<Json<FlatUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_to_api)?;
    let flat = state
        .catalog
        .moderate_flat(ModerateFlatCommand {
            id: payload.id,
            status: payload.status,
        })
        .await?;
    Ok(Json(flat))
}
