use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::listings::{ListingCache, ListingError};
use crate::application::repos::RepoError;
use crate::cache::ListingScope;
use crate::domain::entities::{FlatListing, FlatRecord, HouseRecord, NewFlat, NewHouse};
use crate::domain::error::DomainError;
use crate::domain::types::{FlatStatus, Role};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Listing(#[from] ListingError),
}

#[derive(Debug, Clone)]
pub struct CreateHouseCommand {
    pub address: String,
    pub developer: String,
    pub year: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct CreateFlatCommand {
    pub house_id: i32,
    pub price: i32,
    pub rooms: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct ModerateFlatCommand {
    pub id: i32,
    pub status: FlatStatus,
}

/// House and flat use cases on top of the listing cache.
#[derive(Clone)]
pub struct CatalogService {
    listings: ListingCache,
}

impl CatalogService {
    pub fn new(listings: ListingCache) -> Self {
        Self { listings }
    }

    pub async fn create_house(
        &self,
        command: CreateHouseCommand,
    ) -> Result<HouseRecord, CatalogError> {
        let house = NewHouse {
            address: command.address,
            developer: Some(command.developer),
            year: command.year,
        }
        .normalized()?;
        if house.developer.is_none() {
            return Err(DomainError::validation("developer", "must not be empty").into());
        }

        let saved = self.listings.save_house(house).await?;
        info!(
            target = "listings::catalog",
            house_id = saved.id,
            "house created"
        );
        Ok(saved)
    }

    pub async fn get_house(&self, house_id: i32) -> Result<HouseRecord, CatalogError> {
        self.listings
            .get_house(house_id)
            .await?
            .ok_or_else(|| DomainError::not_found("house").into())
    }

    /// Insert a flat into an existing house and stamp the house's update time.
    pub async fn create_flat(&self, command: CreateFlatCommand) -> Result<FlatRecord, CatalogError> {
        let flat = NewFlat {
            house_id: command.house_id,
            price: command.price,
            rooms: command.rooms,
        };
        flat.validate()?;
        self.get_house(flat.house_id).await?;

        // The insert and the stamp finish together even if the caller goes away.
        let saved = tokio::spawn(insert_and_stamp(self.listings.clone(), flat))
            .await
            .map_err(|err| {
                RepoError::from_persistence(format!("flat creation did not complete: {err}"))
            })??;

        info!(
            target = "listings::catalog",
            flat_id = saved.id,
            house_id = saved.house_id,
            "flat created"
        );
        Ok(saved)
    }

    /// Apply a moderator decision. A flat currently `on moderation` is locked.
    pub async fn moderate_flat(
        &self,
        command: ModerateFlatCommand,
    ) -> Result<FlatRecord, CatalogError> {
        if command.id < 1 {
            return Err(DomainError::validation("id", "must be positive").into());
        }

        let current = self
            .listings
            .get_flat(command.id)
            .await?
            .ok_or_else(|| DomainError::not_found("flat"))?;

        if current.status == FlatStatus::OnModeration {
            return Err(DomainError::conflict(format!(
                "flat {} is under moderation",
                current.id
            ))
            .into());
        }

        let updated = self
            .listings
            .update_flat_status(command.id, command.status)
            .await?;
        info!(
            target = "listings::catalog",
            flat_id = updated.id,
            house_id = updated.house_id,
            from = %current.status,
            to = %updated.status,
            "flat status changed"
        );
        Ok(updated)
    }

    pub async fn list_flats(&self, house_id: i32, role: Role) -> Result<FlatListing, CatalogError> {
        self.get_house(house_id).await?;
        let listing = self
            .listings
            .get_listing(house_id, ListingScope::from(role))
            .await?;
        Ok(listing)
    }
}

async fn insert_and_stamp(listings: ListingCache, flat: NewFlat) -> Result<FlatRecord, CatalogError> {
    let saved = listings.save_flat(flat).await?;

    if let Err(err) = listings
        .update_house_timestamp(saved.house_id, OffsetDateTime::now_utc())
        .await
    {
        warn!(
            target = "listings::catalog",
            flat_id = saved.id,
            house_id = saved.house_id,
            error = %err,
            "flat stored but house update time was not refreshed"
        );
        return Err(err.into());
    }
    Ok(saved)
}
