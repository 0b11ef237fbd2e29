//! Grant workflow retries as seen through the publish and manual grant flows.

use std::time::Duration;

use tradevault::grant::coordinator::{AUTO_GRANT_PREFIX, MANUAL_GRANT_PREFIX};
use tradevault::mocks::make_test_address;
use tradevault::WorkflowResult;

use crate::common::{MarketplaceHarness, TEST_APP};

#[tokio::test]
async fn test_auto_grant_recovers_from_unindexed_dataset() {
    let harness = MarketplaceHarness::new().await;
    harness.network.fail_grants(2).await;

    let published = harness.publish("Momentum", 0.02).await;

    assert_eq!(published.grant, WorkflowResult::Granted { attempts: 3 });
    assert_eq!(harness.delays(), vec![Duration::from_millis(4000); 2]);
    assert_eq!(published.listing.authorized_app.as_deref(), Some(TEST_APP));
    assert!(harness.seller.grants.status().starts_with(AUTO_GRANT_PREFIX));
}

#[tokio::test]
async fn test_auto_grant_gives_up_then_manual_grant_succeeds() {
    let harness = MarketplaceHarness::new().await;
    harness.network.fail_grants(3).await;

    let published = harness.publish("Momentum", 0.25).await;

    assert_eq!(published.grant, WorkflowResult::Failed { attempts: 3 });
    assert_eq!(harness.delays().len(), 2);
    assert_eq!(published.listing.authorized_app, None);
    assert_eq!(
        harness.seller.grants.status(),
        "Auto grant failed after 3 attempts."
    );
    assert!(!harness.seller.grants.is_running());

    let result = harness.seller.grants.manual_grant().await.unwrap();

    assert_eq!(result, WorkflowResult::Granted { attempts: 1 });
    let last = harness.network.grant_requests().await.pop().unwrap();
    assert_eq!(last.price_per_access, 250_000_000);
    assert_eq!(last.number_of_access, 1);
    assert!(harness.seller.grants.status().starts_with(MANUAL_GRANT_PREFIX));
    let listing = harness.seller.catalog.snapshot().await.remove(0);
    assert_eq!(listing.authorized_app.as_deref(), Some(TEST_APP));
}

#[tokio::test]
async fn test_manual_grant_without_publish_is_rejected() {
    let harness = MarketplaceHarness::new().await;
    assert!(harness.buyer.grants.manual_grant().await.is_err());
    assert!(harness.network.grant_requests().await.is_empty());
}

#[tokio::test]
async fn test_manual_grant_needs_connected_wallet() {
    let harness = MarketplaceHarness::new().await;
    harness.publish("Momentum", 0.02).await;
    harness.seller_wallet.disconnect();

    assert!(harness.seller.grants.manual_grant().await.is_err());
}

#[tokio::test]
async fn test_publish_grant_during_running_workflow_changes_nothing() {
    let harness = MarketplaceHarness::new().await;
    let published = harness.publish("Momentum", 0.02).await;
    let plan_before = harness.seller.grants.plan().unwrap();
    let gate = harness.network.gate_grants().await;
    let grants = &harness.seller.grants;

    let (running, concurrent) = tokio::join!(grants.manual_grant(), async {
        assert!(grants.is_running());
        let status = grants.status();

        let result = grants
            .auto_grant_after_publish(&make_test_address(99), 9, 5)
            .await;

        assert_eq!(grants.plan(), Some(plan_before.clone()));
        assert_eq!(grants.status(), status);
        gate.notify_one();
        result
    });

    assert_eq!(concurrent, WorkflowResult::NotStarted);
    assert_eq!(running.unwrap(), WorkflowResult::Granted { attempts: 1 });
    let requests = harness.network.grant_requests().await;
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.protected_data == published.listing.key()));
}
