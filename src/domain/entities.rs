//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::types::{FlatStatus, Role};

/// Registered account. `password_hash` is a PHC string, never the plain secret.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseRecord {
    pub id: i32,
    pub address: String,
    pub year: i32,
    pub developer: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Time the most recent flat was added.
    #[serde(with = "time::serde::rfc3339::option")]
    pub update_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub id: i32,
    pub house_id: i32,
    pub price: i32,
    pub rooms: i32,
    pub status: FlatStatus,
}

/// Flats of a single house as seen by one scope, ordered by flat id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatListing {
    pub flats: Vec<FlatRecord>,
}

impl FlatListing {
    pub fn new(mut flats: Vec<FlatRecord>) -> Self {
        flats.sort_by_key(|flat| flat.id);
        Self { flats }
    }

    pub fn len(&self) -> usize {
        self.flats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flats.is_empty()
    }

    pub fn contains(&self, flat_id: i32) -> bool {
        self.flats.iter().any(|flat| flat.id == flat_id)
    }
}

/// Input for inserting a house.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHouse {
    pub address: String,
    pub developer: Option<String>,
    pub year: i32,
}

impl NewHouse {
    /// Trim text fields and check bounds.
    pub fn normalized(self) -> Result<Self, DomainError> {
        let address = self.address.trim().to_string();
        if address.is_empty() {
            return Err(DomainError::validation("address", "must not be empty"));
        }
        if self.year < 0 {
            return Err(DomainError::validation("year", "must not be negative"));
        }
        let developer = self
            .developer
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            address,
            developer,
            year: self.year,
        })
    }
}

/// Input for inserting a flat; the store assigns id and initial status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewFlat {
    pub house_id: i32,
    pub price: i32,
    pub rooms: i32,
}

impl NewFlat {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.house_id < 1 {
            return Err(DomainError::validation("house_id", "must be positive"));
        }
        if self.price < 0 {
            return Err(DomainError::validation("price", "must not be negative"));
        }
        if self.rooms < 1 {
            return Err(DomainError::validation("rooms", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}
