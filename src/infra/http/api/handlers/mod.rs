//! API handlers grouped by resource.

mod auth;
mod flats;
mod health;
mod houses;

pub use auth::*;
pub use flats::*;
pub use health::*;
pub use houses::*;

use axum::extract::rejection::{JsonRejection, QueryRejection};

use super::error::ApiError;

pub(crate) fn json_to_api(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request("invalid request body", Some(rejection.body_text()))
}

pub(crate) fn query_to_api(rejection: QueryRejection) -> ApiError {
    ApiError::bad_request("invalid query parameters", Some(rejection.body_text()))
}
