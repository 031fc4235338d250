use async_trait::async_trait;

use crate::application::repos::{FlatFilter, FlatsRepo, RepoError};
use crate::domain::entities::{FlatRecord, NewFlat};
use crate::domain::types::FlatStatus;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct FlatRow {
    id: i32,
    house_id: i32,
    price: i32,
    rooms: i32,
    status: FlatStatus,
}

impl From<FlatRow> for FlatRecord {
    fn from(row: FlatRow) -> Self {
        Self {
            id: row.id,
            house_id: row.house_id,
            price: row.price,
            rooms: row.rooms,
            status: row.status,
        }
    }
}

#[async_trait]
impl FlatsRepo for PostgresRepositories {
    async fn save_flat(&self, flat: NewFlat) -> Result<FlatRecord, RepoError> {
        let row = sqlx::query_as::<_, FlatRow>(
            r#"
            INSERT INTO flats (house_id, price, rooms)
            VALUES ($1, $2, $3)
            RETURNING id, house_id, price, rooms, status
            "#,
        )
        .bind(flat.house_id)
        .bind(flat.price)
        .bind(flat.rooms)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn get_flat(&self, id: i32) -> Result<Option<FlatRecord>, RepoError> {
        let row = sqlx::query_as::<_, FlatRow>(
            "SELECT id, house_id, price, rooms, status FROM flats WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn update_flat_status(
        &self,
        id: i32,
        status: FlatStatus,
    ) -> Result<FlatRecord, RepoError> {
        let row = sqlx::query_as::<_, FlatRow>(
            r#"
            UPDATE flats SET status = $2
            WHERE id = $1
            RETURNING id, house_id, price, rooms, status
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(Into::into).ok_or(RepoError::NotFound)
    }

    async fn list_flats_by_house(
        &self,
        house_id: i32,
        filter: FlatFilter,
    ) -> Result<Vec<FlatRecord>, RepoError> {
        let rows = match filter {
            FlatFilter::All => {
                sqlx::query_as::<_, FlatRow>(
                    r#"
                    SELECT id, house_id, price, rooms, status
                    FROM flats
                    WHERE house_id = $1
                    ORDER BY id
                    "#,
                )
                .bind(house_id)
                .fetch_all(self.pool())
                .await
            }
            FlatFilter::ApprovedOnly => {
                sqlx::query_as::<_, FlatRow>(
                    r#"
                    SELECT id, house_id, price, rooms, status
                    FROM flats
                    WHERE house_id = $1 AND status = $2
                    ORDER BY id
                    "#,
                )
                .bind(house_id)
                .bind(FlatStatus::Approved)
                .fetch_all(self.pool())
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
