//! Counter names emitted by the listing cache.

mod support;

use std::collections::HashSet;
use std::sync::Arc;

use listings::application::catalog::{CreateHouseCommand, ModerateFlatCommand};
use listings::application::listings::ListingCache;
use listings::cache::{CacheConfig, ListingKey, ListingScope, MemoryViewStore, ViewStore};
use listings::domain::types::{FlatStatus, Role};
use metrics_util::debugging::DebuggingRecorder;
use serial_test::serial;

use support::{Harness, MemoryStore};

#[tokio::test]
#[serial]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let harness = Harness::new();
    let house_id = harness
        .catalog
        .create_house(CreateHouseCommand {
            address: "Metrics 1".to_string(),
            developer: "Dev".to_string(),
            year: 2010,
        })
        .await
        .expect("house")
        .id;
    harness.store.seed_flat(1, house_id, FlatStatus::Created).await;

    // miss, then hit
    harness.catalog.list_flats(house_id, Role::Moderator).await.expect("miss");
    harness.catalog.list_flats(house_id, Role::Moderator).await.expect("hit");

    // corrupt entry counts as a fault
    harness
        .views
        .put(
            ListingKey::new(ListingScope::Client, house_id),
            bytes::Bytes::from_static(b"{"),
        )
        .await
        .expect("put");
    harness.catalog.list_flats(house_id, Role::Client).await.expect("fault");

    harness
        .catalog
        .moderate_flat(ModerateFlatCommand {
            id: 1,
            status: FlatStatus::Approved,
        })
        .await
        .expect("approve");

    // capacity of one forces an eviction
    let tiny = Arc::new(MemoryViewStore::new(&CacheConfig {
        capacity: 1,
        ..Default::default()
    }));
    let store = Arc::new(MemoryStore::default());
    let cache = ListingCache::new(store, tiny);
    cache.get_listing(1, ListingScope::Client).await.expect("first");
    cache.get_listing(2, ListingScope::Client).await.expect("second");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for expected in [
        "listings_cache_hit_total",
        "listings_cache_miss_total",
        "listings_cache_fault_total",
        "listings_cache_evict_total",
    ] {
        assert!(names.contains(expected), "missing metric {expected}");
    }
}
