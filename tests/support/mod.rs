//! In-memory store shared by the integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use listings::application::accounts::AccountService;
use listings::application::auth::{AccessControl, AuthConfig};
use listings::application::catalog::CatalogService;
use listings::application::listings::ListingCache;
use listings::application::repos::{
    FlatFilter, FlatsRepo, HousesRepo, RepoError, StoreHealth, UsersRepo,
};
use listings::cache::{CacheConfig, MemoryViewStore};
use listings::domain::entities::{
    FlatRecord, HouseRecord, NewFlat, NewHouse, NewUser, UserRecord,
};
use listings::domain::types::FlatStatus;
use listings::infra::http::ApiState;
use secrecy::SecretString;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const SECRET: &str = "integration-secret";

#[derive(Default)]
struct Tables {
    users: BTreeMap<Uuid, UserRecord>,
    houses: BTreeMap<i32, HouseRecord>,
    flats: BTreeMap<i32, FlatRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    list_calls: AtomicUsize,
    unhealthy: AtomicBool,
    ack_delay: std::sync::Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }

    /// Hold back the reply of flat writes for `delay` after they commit.
    pub fn set_ack_delay(&self, delay: Option<Duration>) {
        *self.ack_delay.lock().expect("ack delay lock") = delay;
    }

    async fn acknowledge(&self) {
        let delay = *self.ack_delay.lock().expect("ack delay lock");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Insert a flat with an explicit status, bypassing the service layer.
    pub async fn seed_flat(&self, id: i32, house_id: i32, status: FlatStatus) {
        self.tables.lock().await.flats.insert(
            id,
            FlatRecord {
                id,
                house_id,
                price: 5_000_000,
                rooms: 2,
                status,
            },
        );
    }

    /// Change a flat behind the cache's back.
    pub async fn force_status(&self, id: i32, status: FlatStatus) {
        if let Some(flat) = self.tables.lock().await.flats.get_mut(&id) {
            flat.status = status;
        }
    }

    pub async fn house(&self, id: i32) -> Option<HouseRecord> {
        self.tables.lock().await.houses.get(&id).cloned()
    }
}

#[async_trait]
impl UsersRepo for MemoryStore {
    async fn save_user(&self, user: NewUser) -> Result<UserRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|existing| existing.email == user.email) {
            return Err(RepoError::Duplicate {
                constraint: "users_email_key".to_string(),
            });
        }
        let record = UserRecord {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl HousesRepo for MemoryStore {
    async fn save_house(&self, house: NewHouse) -> Result<HouseRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let id = tables.houses.keys().next_back().copied().unwrap_or(0) + 1;
        let record = HouseRecord {
            id,
            address: house.address,
            year: house.year,
            developer: house.developer,
            created_at: OffsetDateTime::now_utc(),
            update_at: None,
        };
        tables.houses.insert(id, record.clone());
        Ok(record)
    }

    async fn get_house(&self, id: i32) -> Result<Option<HouseRecord>, RepoError> {
        Ok(self.tables.lock().await.houses.get(&id).cloned())
    }

    async fn update_house_timestamp(
        &self,
        id: i32,
        at: OffsetDateTime,
    ) -> Result<HouseRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let house = tables.houses.get_mut(&id).ok_or(RepoError::NotFound)?;
        house.update_at = Some(at);
        Ok(house.clone())
    }
}

#[async_trait]
impl FlatsRepo for MemoryStore {
    async fn save_flat(&self, flat: NewFlat) -> Result<FlatRecord, RepoError> {
        let record = {
            let mut tables = self.tables.lock().await;
            if !tables.houses.contains_key(&flat.house_id) {
                return Err(RepoError::InvalidInput {
                    message: "flats_house_id_fkey".to_string(),
                });
            }
            let id = tables.flats.keys().next_back().copied().unwrap_or(0) + 1;
            let record = FlatRecord {
                id,
                house_id: flat.house_id,
                price: flat.price,
                rooms: flat.rooms,
                status: FlatStatus::Created,
            };
            tables.flats.insert(id, record.clone());
            record
        };
        self.acknowledge().await;
        Ok(record)
    }

    async fn get_flat(&self, id: i32) -> Result<Option<FlatRecord>, RepoError> {
        Ok(self.tables.lock().await.flats.get(&id).cloned())
    }

    async fn update_flat_status(
        &self,
        id: i32,
        status: FlatStatus,
    ) -> Result<FlatRecord, RepoError> {
        let updated = {
            let mut tables = self.tables.lock().await;
            let flat = tables.flats.get_mut(&id).ok_or(RepoError::NotFound)?;
            flat.status = status;
            flat.clone()
        };
        self.acknowledge().await;
        Ok(updated)
    }

    async fn list_flats_by_house(
        &self,
        house_id: i32,
        filter: FlatFilter,
    ) -> Result<Vec<FlatRecord>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tables
            .lock()
            .await
            .flats
            .values()
            .filter(|flat| flat.house_id == house_id)
            .filter(|flat| filter == FlatFilter::All || flat.status.is_public())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub views: Arc<MemoryViewStore>,
    pub listings: ListingCache,
    pub catalog: CatalogService,
    pub accounts: AccountService,
    pub access: Arc<AccessControl>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let views = Arc::new(MemoryViewStore::new(&CacheConfig::default()));
        let listings = ListingCache::new(store.clone(), views.clone());
        let access = Arc::new(AccessControl::new(AuthConfig::new(
            SecretString::new(SECRET.into()),
            Duration::from_secs(3 * 60 * 60),
        )));

        Self {
            catalog: CatalogService::new(listings.clone()),
            accounts: AccountService::new(listings.clone(), access.clone()),
            store,
            views,
            listings,
            access,
        }
    }

    pub fn api_state(&self) -> ApiState {
        ApiState {
            access: self.access.clone(),
            accounts: self.accounts.clone(),
            catalog: self.catalog.clone(),
            health: self.store.clone(),
        }
    }
}
