//! Cache-aside access to the persistent store.
//!
//! Flat listings are served from the [`ViewStore`] when possible and rebuilt
//! from the store on a miss. Every write that can change a listing drops both
//! scope entries of the affected house after the store commits. Cache
//! failures are logged and counted; they never fail a read or a write.

use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::repos::{ListingsStore, RepoError};
use crate::cache::{CacheLookup, ListingKey, ListingScope, ViewStore};
use crate::domain::entities::{
    FlatListing, FlatRecord, HouseRecord, NewFlat, NewHouse, NewUser, UserRecord,
};
use crate::domain::types::FlatStatus;

pub(crate) const METRIC_CACHE_HIT: &str = "listings_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "listings_cache_miss_total";
pub(crate) const METRIC_CACHE_FAULT: &str = "listings_cache_fault_total";
pub(crate) const METRIC_CACHE_PUT_FAILED: &str = "listings_cache_put_failed_total";
pub(crate) const METRIC_CACHE_INVALIDATE_FAILED: &str = "listings_cache_invalidate_failed_total";

const TARGET: &str = "listings::cache";

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("failed to fetch listing for house {house_id}")]
    Fetch {
        house_id: i32,
        #[source]
        source: RepoError,
    },
}

#[derive(Clone)]
pub struct ListingCache {
    store: Arc<dyn ListingsStore>,
    views: Option<Arc<dyn ViewStore>>,
}

impl ListingCache {
    pub fn new(store: Arc<dyn ListingsStore>, views: Arc<dyn ViewStore>) -> Self {
        Self {
            store,
            views: Some(views),
        }
    }

    /// Read-through only; invalidation becomes a no-op.
    pub fn uncached(store: Arc<dyn ListingsStore>) -> Self {
        Self { store, views: None }
    }

    pub fn with_views_opt(store: Arc<dyn ListingsStore>, views: Option<Arc<dyn ViewStore>>) -> Self {
        Self { store, views }
    }

    pub async fn get_listing(
        &self,
        house_id: i32,
        scope: ListingScope,
    ) -> Result<FlatListing, ListingError> {
        let key = ListingKey::new(scope, house_id);
        let Some(views) = self.views.as_ref() else {
            return self.fetch(key).await;
        };

        match views.get(&key).await {
            CacheLookup::Hit(body) => match serde_json::from_slice::<FlatListing>(&body) {
                Ok(listing) => {
                    counter!(METRIC_CACHE_HIT).increment(1);
                    return Ok(listing);
                }
                Err(err) => record_fault(&key, &format!("corrupt entry: {err}")),
            },
            CacheLookup::Miss => {
                counter!(METRIC_CACHE_MISS).increment(1);
            }
            CacheLookup::Fault(reason) => record_fault(&key, &reason),
        }

        let listing = self.fetch(key).await?;
        populate(views.as_ref(), key, &listing).await;
        Ok(listing)
    }

    pub async fn save_flat(&self, flat: NewFlat) -> Result<FlatRecord, RepoError> {
        let (store, views) = self.handles();
        run_to_completion("save_flat", async move {
            let saved = store.save_flat(flat).await?;
            invalidate_house(views.as_deref(), saved.house_id, "save_flat").await;
            Ok(saved)
        })
        .await
    }

    pub async fn update_flat_status(
        &self,
        flat_id: i32,
        status: FlatStatus,
    ) -> Result<FlatRecord, RepoError> {
        let (store, views) = self.handles();
        run_to_completion("update_flat_status", async move {
            let updated = store.update_flat_status(flat_id, status).await?;
            invalidate_house(views.as_deref(), updated.house_id, "update_flat_status").await;
            Ok(updated)
        })
        .await
    }

    pub async fn save_house(&self, house: NewHouse) -> Result<HouseRecord, RepoError> {
        let (store, views) = self.handles();
        run_to_completion("save_house", async move {
            let saved = store.save_house(house).await?;
            invalidate_house(views.as_deref(), saved.id, "save_house").await;
            Ok(saved)
        })
        .await
    }

    pub async fn update_house_timestamp(
        &self,
        house_id: i32,
        at: OffsetDateTime,
    ) -> Result<HouseRecord, RepoError> {
        let (store, views) = self.handles();
        run_to_completion("update_house_timestamp", async move {
            let updated = store.update_house_timestamp(house_id, at).await?;
            invalidate_house(views.as_deref(), house_id, "update_house_timestamp").await;
            Ok(updated)
        })
        .await
    }

    pub async fn save_user(&self, user: NewUser) -> Result<UserRecord, RepoError> {
        self.store.save_user(user).await
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        self.store.get_user_by_id(id).await
    }

    pub async fn get_house(&self, id: i32) -> Result<Option<HouseRecord>, RepoError> {
        self.store.get_house(id).await
    }

    pub async fn get_flat(&self, id: i32) -> Result<Option<FlatRecord>, RepoError> {
        self.store.get_flat(id).await
    }

    async fn fetch(&self, key: ListingKey) -> Result<FlatListing, ListingError> {
        let flats = self
            .store
            .list_flats_by_house(key.house_id, key.scope.filter())
            .await
            .map_err(|source| ListingError::Fetch {
                house_id: key.house_id,
                source,
            })?;
        Ok(FlatListing::new(flats))
    }

    fn handles(&self) -> (Arc<dyn ListingsStore>, Option<Arc<dyn ViewStore>>) {
        (self.store.clone(), self.views.clone())
    }
}

/// Run a write together with its invalidations on a task of its own. A caller
/// dropped mid-write, e.g. by the request timeout, does not stop the pair.
async fn run_to_completion<T, F>(op: &'static str, write: F) -> Result<T, RepoError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, RepoError>> + Send + 'static,
{
    tokio::spawn(write).await.map_err(|err| {
        error!(target = TARGET, op, error = %err, "write task did not complete");
        RepoError::from_persistence(format!("{op} did not complete: {err}"))
    })?
}

/// Drop both scope entries of a house; every key is attempted.
async fn invalidate_house(views: Option<&dyn ViewStore>, house_id: i32, cause: &'static str) {
    let Some(views) = views else {
        return;
    };

    for key in ListingKey::for_house(house_id) {
        if let Err(err) = views.invalidate(&key).await {
            counter!(METRIC_CACHE_INVALIDATE_FAILED).increment(1);
            error!(
                target = TARGET,
                key = %key,
                cause,
                error = %err,
                "failed to invalidate listing; entry may be stale until it expires"
            );
        }
    }
    debug!(target = TARGET, house_id, cause, "listing entries invalidated");
}

fn record_fault(key: &ListingKey, reason: &str) {
    counter!(METRIC_CACHE_FAULT).increment(1);
    warn!(
        target = TARGET,
        key = %key,
        reason,
        "listing cache fault; reading from store"
    );
}

async fn populate(views: &dyn ViewStore, key: ListingKey, listing: &FlatListing) {
    let body = match serde_json::to_vec(listing) {
        Ok(body) => Bytes::from(body),
        Err(err) => {
            counter!(METRIC_CACHE_PUT_FAILED).increment(1);
            warn!(target = TARGET, key = %key, error = %err, "failed to encode listing");
            return;
        }
    };

    if let Err(err) = views.put(key, body).await {
        counter!(METRIC_CACHE_PUT_FAILED).increment(1);
        warn!(target = TARGET, key = %key, error = %err, "failed to store listing");
    }
}
