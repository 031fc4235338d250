use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::{FlatStatus, Role};

#[derive(Debug, Deserialize)]
pub struct DummyLoginQuery {
    pub user_type: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub user_type: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub id: Uuid,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct HouseCreateRequest {
    pub address: String,
    pub year: i32,
    pub developer: String,
}

#[derive(Debug, Deserialize)]
pub struct FlatCreateRequest {
    pub house_id: i32,
    pub price: i32,
    pub rooms: i32,
}

#[derive(Debug, Deserialize)]
pub struct FlatUpdateRequest {
    pub id: i32,
    pub status: FlatStatus,
}
