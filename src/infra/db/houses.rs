use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{HousesRepo, RepoError};
use crate::domain::entities::{HouseRecord, NewHouse};

use super::{PostgresRepositories, map_sqlx_error};

const HOUSE_COLUMNS: &str = "id, address, year, developer, created_at, update_at";

#[derive(sqlx::FromRow)]
struct HouseRow {
    id: i32,
    address: String,
    year: i32,
    developer: Option<String>,
    created_at: OffsetDateTime,
    update_at: Option<OffsetDateTime>,
}

impl From<HouseRow> for HouseRecord {
    fn from(row: HouseRow) -> Self {
        Self {
            id: row.id,
            address: row.address,
            year: row.year,
            developer: row.developer,
            created_at: row.created_at,
            update_at: row.update_at,
        }
    }
}

#[async_trait]
impl HousesRepo for PostgresRepositories {
    async fn save_house(&self, house: NewHouse) -> Result<HouseRecord, RepoError> {
        let sql = format!(
            "INSERT INTO houses (address, year, developer) VALUES ($1, $2, $3) RETURNING {HOUSE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, HouseRow>(&sql)
            .bind(house.address)
            .bind(house.year)
            .bind(house.developer)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn get_house(&self, id: i32) -> Result<Option<HouseRecord>, RepoError> {
        let sql = format!("SELECT {HOUSE_COLUMNS} FROM houses WHERE id = $1");
        let row = sqlx::query_as::<_, HouseRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn update_house_timestamp(
        &self,
        id: i32,
        at: OffsetDateTime,
    ) -> Result<HouseRecord, RepoError> {
        let sql = format!("UPDATE houses SET update_at = $2 WHERE id = $1 RETURNING {HOUSE_COLUMNS}");
        let row = sqlx::query_as::<_, HouseRow>(&sql)
            .bind(id)
            .bind(at)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(Into::into).ok_or(RepoError::NotFound)
    }
}
