//! House handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, State};
use axum::response::IntoResponse;

use crate::application::auth::{AccessControl, VerifiedToken};
use crate::application::catalog::CreateHouseCommand;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

use super::json_to_api;

pub async fn create_house(
    State(state): State<ApiState>,
    payload: Result<Json<HouseCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_to_api)?;
    let house = state
        .catalog
        .create_house(CreateHouseCommand {
            address: payload.address,
            developer: payload.developer,
            year: payload.year,
        })
        .await?;
    Ok(Json(house))
}

/// Flats of a house as visible to the caller's role.
pub async fn list_house_flats(
    State(state): State<ApiState>,
    Extension(token): Extension<VerifiedToken>,
    house_id: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(house_id) = house_id.map_err(|rejection| {
        ApiError::bad_request("invalid house id", Some(rejection.body_text()))
    })?;
    let listing = state
        .catalog
        .list_flats(house_id, AccessControl::role_of(&token))
        .await?;
    Ok(Json(listing))
}
