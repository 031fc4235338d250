//! Service-level checks that listings stay consistent with writes.

mod support;

use listings::application::catalog::{
    CatalogError, CreateFlatCommand, CreateHouseCommand, ModerateFlatCommand,
};
use listings::cache::{CacheLookup, ListingKey, ListingScope, ViewStore};
use listings::domain::error::DomainError;
use listings::domain::types::{FlatStatus, Role};

use support::Harness;

async fn house(harness: &Harness) -> i32 {
    harness
        .catalog
        .create_house(CreateHouseCommand {
            address: "Lesnaya 7".to_string(),
            developer: "Mosstroy".to_string(),
            year: 2001,
        })
        .await
        .expect("house")
        .id
}

fn ids(listing: &listings::domain::entities::FlatListing) -> Vec<i32> {
    listing.flats.iter().map(|flat| flat.id).collect()
}

#[tokio::test]
async fn visibility_depends_on_role() {
    let harness = Harness::new();
    let house_id = house(&harness).await;
    harness.store.seed_flat(1, house_id, FlatStatus::Approved).await;
    harness.store.seed_flat(2, house_id, FlatStatus::Created).await;

    let client = harness
        .catalog
        .list_flats(house_id, Role::Client)
        .await
        .expect("client listing");
    let moderator = harness
        .catalog
        .list_flats(house_id, Role::Moderator)
        .await
        .expect("moderator listing");

    assert_eq!(ids(&client), vec![1]);
    assert_eq!(ids(&moderator), vec![1, 2]);
}

#[tokio::test]
async fn repeated_reads_come_from_cache() {
    let harness = Harness::new();
    let house_id = house(&harness).await;
    harness.store.seed_flat(1, house_id, FlatStatus::Approved).await;

    for _ in 0..3 {
        harness
            .catalog
            .list_flats(house_id, Role::Client)
            .await
            .expect("listing");
    }

    assert_eq!(harness.store.list_calls(), 1);
    assert!(harness
        .views
        .contains(&ListingKey::new(ListingScope::Client, house_id)));
}

#[tokio::test]
async fn new_flat_shows_up_for_moderators_only() {
    let harness = Harness::new();
    let house_id = house(&harness).await;
    harness.store.seed_flat(1, house_id, FlatStatus::Approved).await;

    // Warm both scopes.
    harness.catalog.list_flats(house_id, Role::Client).await.expect("client");
    harness
        .catalog
        .list_flats(house_id, Role::Moderator)
        .await
        .expect("moderator");

    let created = harness
        .catalog
        .create_flat(CreateFlatCommand {
            house_id,
            price: 7_000_000,
            rooms: 3,
        })
        .await
        .expect("flat");
    assert_eq!(created.status, FlatStatus::Created);

    let moderator = harness
        .catalog
        .list_flats(house_id, Role::Moderator)
        .await
        .expect("moderator");
    let client = harness
        .catalog
        .list_flats(house_id, Role::Client)
        .await
        .expect("client");

    assert!(moderator.contains(created.id));
    assert!(!client.contains(created.id));
}

#[tokio::test]
async fn creating_a_flat_stamps_the_house() {
    let harness = Harness::new();
    let house_id = house(&harness).await;
    assert!(harness.store.house(house_id).await.expect("house").update_at.is_none());

    harness
        .catalog
        .create_flat(CreateFlatCommand {
            house_id,
            price: 1,
            rooms: 1,
        })
        .await
        .expect("flat");

    assert!(harness.store.house(house_id).await.expect("house").update_at.is_some());
}

#[tokio::test]
async fn approval_reaches_clients_immediately() {
    let harness = Harness::new();
    let house_id = house(&harness).await;
    harness.store.seed_flat(1, house_id, FlatStatus::Approved).await;
    harness.store.seed_flat(2, house_id, FlatStatus::Created).await;

    let before = harness
        .catalog
        .list_flats(house_id, Role::Client)
        .await
        .expect("before");
    assert_eq!(ids(&before), vec![1]);
    let moderator_before = harness
        .catalog
        .list_flats(house_id, Role::Moderator)
        .await
        .expect("moderator before");
    assert_eq!(ids(&moderator_before), vec![1, 2]);

    harness
        .catalog
        .moderate_flat(ModerateFlatCommand {
            id: 2,
            status: FlatStatus::Approved,
        })
        .await
        .expect("approve");

    let after = harness
        .catalog
        .list_flats(house_id, Role::Client)
        .await
        .expect("after");
    assert_eq!(ids(&after), vec![1, 2]);

    let moderator_after = harness
        .catalog
        .list_flats(house_id, Role::Moderator)
        .await
        .expect("moderator after");
    assert_eq!(ids(&moderator_after), vec![1, 2]);
    assert!(
        moderator_after
            .flats
            .iter()
            .all(|flat| flat.status == FlatStatus::Approved)
    );
}

#[tokio::test]
async fn decline_removes_flat_from_client_view() {
    let harness = Harness::new();
    let house_id = house(&harness).await;
    harness.store.seed_flat(1, house_id, FlatStatus::Approved).await;

    harness.catalog.list_flats(house_id, Role::Client).await.expect("warm");
    harness
        .catalog
        .moderate_flat(ModerateFlatCommand {
            id: 1,
            status: FlatStatus::Declined,
        })
        .await
        .expect("decline");

    let client = harness
        .catalog
        .list_flats(house_id, Role::Client)
        .await
        .expect("client");
    assert!(client.is_empty());
}

#[tokio::test]
async fn flat_under_moderation_is_locked() {
    let harness = Harness::new();
    let house_id = house(&harness).await;
    harness
        .store
        .seed_flat(5, house_id, FlatStatus::OnModeration)
        .await;

    let err = harness
        .catalog
        .moderate_flat(ModerateFlatCommand {
            id: 5,
            status: FlatStatus::Approved,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CatalogError::Domain(DomainError::Conflict { .. })
    ));
    let moderator = harness
        .catalog
        .list_flats(house_id, Role::Moderator)
        .await
        .expect("listing");
    assert_eq!(moderator.flats[0].status, FlatStatus::OnModeration);
}

#[tokio::test]
async fn rejected_write_leaves_cache_untouched() {
    let harness = Harness::new();
    let house_id = house(&harness).await;
    harness
        .store
        .seed_flat(5, house_id, FlatStatus::OnModeration)
        .await;
    harness
        .catalog
        .list_flats(house_id, Role::Moderator)
        .await
        .expect("warm");

    let _ = harness
        .catalog
        .moderate_flat(ModerateFlatCommand {
            id: 5,
            status: FlatStatus::Declined,
        })
        .await;

    let key = ListingKey::new(ListingScope::Moderator, house_id);
    assert!(matches!(harness.views.get(&key).await, CacheLookup::Hit(_)));
}

#[tokio::test]
async fn missing_house_and_flat_are_not_found() {
    let harness = Harness::new();

    let listing = harness.catalog.list_flats(42, Role::Client).await.unwrap_err();
    assert!(matches!(
        listing,
        CatalogError::Domain(DomainError::NotFound { entity: "house" })
    ));

    let create = harness
        .catalog
        .create_flat(CreateFlatCommand {
            house_id: 42,
            price: 1,
            rooms: 1,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        create,
        CatalogError::Domain(DomainError::NotFound { entity: "house" })
    ));

    let moderate = harness
        .catalog
        .moderate_flat(ModerateFlatCommand {
            id: 9,
            status: FlatStatus::Approved,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        moderate,
        CatalogError::Domain(DomainError::NotFound { entity: "flat" })
    ));
}

#[tokio::test]
async fn invalid_input_is_rejected_before_the_store() {
    let harness = Harness::new();
    let house_id = house(&harness).await;

    let cases = [
        CreateFlatCommand {
            house_id,
            price: -1,
            rooms: 1,
        },
        CreateFlatCommand {
            house_id,
            price: 1,
            rooms: 0,
        },
        CreateFlatCommand {
            house_id: 0,
            price: 1,
            rooms: 1,
        },
    ];
    for command in cases {
        let err = harness.catalog.create_flat(command).await.unwrap_err();
        assert!(
            matches!(err, CatalogError::Domain(DomainError::Validation { .. })),
            "{command:?} was accepted"
        );
    }

    let house = harness
        .catalog
        .create_house(CreateHouseCommand {
            address: "  ".to_string(),
            developer: "Dev".to_string(),
            year: 1990,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        house,
        CatalogError::Domain(DomainError::Validation { field: "address", .. })
    ));

    let developer = harness
        .catalog
        .create_house(CreateHouseCommand {
            address: "Tverskaya 1".to_string(),
            developer: String::new(),
            year: 1990,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        developer,
        CatalogError::Domain(DomainError::Validation { field: "developer", .. })
    ));
}
