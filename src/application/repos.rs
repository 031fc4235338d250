//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{FlatRecord, HouseRecord, NewFlat, NewHouse, NewUser, UserRecord};
use crate::domain::types::FlatStatus;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Which flats of a house a listing query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatFilter {
    /// Approved flats only.
    ApprovedOnly,
    /// Every flat regardless of status.
    All,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn save_user(&self, user: NewUser) -> Result<UserRecord, RepoError>;

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;
}

#[async_trait]
pub trait HousesRepo: Send + Sync {
    async fn save_house(&self, house: NewHouse) -> Result<HouseRecord, RepoError>;

    async fn get_house(&self, id: i32) -> Result<Option<HouseRecord>, RepoError>;

    /// Stamp the last-flat-added time. `NotFound` when the house is missing.
    async fn update_house_timestamp(
        &self,
        id: i32,
        at: OffsetDateTime,
    ) -> Result<HouseRecord, RepoError>;
}

#[async_trait]
pub trait FlatsRepo: Send + Sync {
    async fn save_flat(&self, flat: NewFlat) -> Result<FlatRecord, RepoError>;

    async fn get_flat(&self, id: i32) -> Result<Option<FlatRecord>, RepoError>;

    /// Returns the updated row, including its owning house. `NotFound` when missing.
    async fn update_flat_status(
        &self,
        id: i32,
        status: FlatStatus,
    ) -> Result<FlatRecord, RepoError>;

    /// Flats of a house ordered by id ascending.
    async fn list_flats_by_house(
        &self,
        house_id: i32,
        filter: FlatFilter,
    ) -> Result<Vec<FlatRecord>, RepoError>;
}

/// Full persistent store used by the listing cache.
pub trait ListingsStore: UsersRepo + HousesRepo + FlatsRepo {}

impl<T> ListingsStore for T where T: UsersRepo + HousesRepo + FlatsRepo {}

/// Liveness probe of the backing store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
