//! Catalog refresh against the network and the persisted hidden set.

use serde_json::json;
use tradevault::actions::{delist, refresh_catalog};
use tradevault::mocks::{make_test_address, MemoryStore, MockTime, MockWallet};
use tradevault::{
    GrantOutcome, HiddenSet, KeyValueStore, Listing, PublishedResource, SharedAppState, VaultConfig,
};

use crate::common::{MarketplaceHarness, SELLER};

fn resource(id: u64, schema: serde_json::Value) -> PublishedResource {
    PublishedResource {
        address: make_test_address(id),
        name: None,
        owner: SELLER.to_string(),
        schema: schema.as_object().cloned().unwrap_or_default(),
    }
}

#[tokio::test]
async fn test_refresh_keeps_local_drafts_and_skips_non_strategies() {
    let harness = MarketplaceHarness::new().await;
    harness
        .network
        .add_resource(resource(100, json!({"file-key": "bytes"})))
        .await;
    harness
        .network
        .add_resource(resource(101, json!({"email": "string"})))
        .await;
    let draft = Listing::builder_with_time(MockTime::new(5))
        .id("local-draft")
        .title("Draft")
        .owner(SELLER)
        .build()
        .unwrap();
    harness.buyer.catalog.prepend(draft).await;

    let count = refresh_catalog(&harness.buyer).await.unwrap();

    assert_eq!(count, 2);
    let snapshot = harness.buyer.catalog.snapshot().await;
    assert_eq!(snapshot[0].key(), make_test_address(100));
    assert_eq!(snapshot[0].title, "Strategy 0x0000");
    assert_eq!(snapshot[1].id, "local-draft");
}

#[tokio::test]
async fn test_refresh_reads_first_grant_restriction() {
    let harness = MarketplaceHarness::new().await;
    let address = make_test_address(7);
    harness.network.add_resource(resource(7, json!({"zipfile": "application/zip"}))).await;
    for app in ["0xfirst", "0xsecond"] {
        harness
            .network
            .add_grant(
                &address,
                GrantOutcome {
                    app_restrict: Some(app.to_string()),
                    ..GrantOutcome::default()
                },
            )
            .await;
    }

    refresh_catalog(&harness.buyer).await.unwrap();

    let listing = harness.buyer.catalog.get(&address).await.unwrap();
    assert_eq!(listing.authorized_app.as_deref(), Some("0xfirst"));
}

#[tokio::test]
async fn test_hidden_resources_stay_hidden_across_refreshes() {
    let harness = MarketplaceHarness::new().await;
    let published = harness.publish("Momentum", 0.02).await;
    refresh_catalog(&harness.seller).await.unwrap();

    delist(&harness.seller, &published.listing).await.unwrap();
    assert_eq!(refresh_catalog(&harness.seller).await.unwrap(), 0);
    assert_eq!(refresh_catalog(&harness.seller).await.unwrap(), 0);

    // The buyer has its own local storage and still sees the resource.
    assert_eq!(refresh_catalog(&harness.buyer).await.unwrap(), 1);
}

#[tokio::test]
async fn test_hidden_set_written_by_another_view_is_respected() {
    let harness = MarketplaceHarness::new().await;
    let published = harness.publish("Momentum", 0.02).await;
    let key = published.listing.key();

    HiddenSet::new(harness.buyer_store.clone())
        .insert(&key.to_uppercase())
        .unwrap();
    let raw = harness.buyer_store.get("hiddenPdAddresses").unwrap().unwrap();
    assert!(raw.contains(&key));

    assert_eq!(refresh_catalog(&harness.buyer).await.unwrap(), 0);
}

#[tokio::test]
async fn test_listing_failure_leaves_catalog_untouched() {
    let harness = MarketplaceHarness::new().await;
    harness.publish("Momentum", 0.02).await;
    harness.network.fail_listing(true).await;

    assert!(refresh_catalog(&harness.seller).await.is_err());
    assert_eq!(harness.seller.catalog.len().await, 1);
}

#[tokio::test]
async fn test_discovery_disabled_keeps_only_session_listings() {
    let harness = MarketplaceHarness::new().await;
    harness.publish("Momentum", 0.02).await;
    let offline = SharedAppState::new(
        VaultConfig {
            auto_load_listings: false,
            ..VaultConfig::default()
        },
        harness.network.clone(),
        MockWallet::new(SELLER),
        MockTime::new(1),
        MemoryStore::new(),
    );

    assert_eq!(refresh_catalog(&offline).await.unwrap(), 0);
    assert!(offline.catalog.is_empty().await);
    assert_eq!(refresh_catalog(&harness.buyer).await.unwrap(), 1);
}
