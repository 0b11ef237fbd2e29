//! End-to-end runs through publish, grant, discovery, job and result.

use std::collections::BTreeSet;

use tradevault::actions::{delist, execute_action, refresh_catalog};
use tradevault::job::JobResponse;
use tradevault::mocks::{make_test_zip, MockTime, TestZipEntry};
use tradevault::{
    reconcile_listings, ContentKind, GrantRequest, Interpretation, JobStatusEvent, Listing,
    RunArgs, RunPhase, VaultError, WorkflowResult,
};

use crate::common::{MarketplaceHarness, BUYER, SELLER, TEST_APP};

fn completed(task_id: &str, result: Vec<u8>) -> JobResponse {
    JobResponse {
        task_id: Some(task_id.to_string()),
        deal_id: Some("0xdeal".to_string()),
        result: Some(result),
    }
}

#[tokio::test]
async fn test_score_result_inline() {
    let harness = MarketplaceHarness::new().await;
    let published = harness.publish("Momentum", 0.02).await;
    harness
        .network
        .script_job(
            vec![JobStatusEvent::new("Task running", false).with_task_id("0xtask")],
            Ok(completed("0xtask", br#"{"fiability-score": 0.82}"#.to_vec())),
        )
        .await;

    let mut runner = harness.buyer.job_runner();
    let outcome = runner
        .run(&published.listing, TEST_APP, &RunArgs::Raw(String::new()), None)
        .await
        .unwrap();

    let result = outcome.result.outcome;
    assert_eq!(result.preview, "Fiability score: 0.82");
    assert_eq!(result.kind, ContentKind::Text);
    assert!(result.action().is_none());
    assert_eq!(runner.phase(), RunPhase::ResultResolved);
}

#[tokio::test]
async fn test_action_result_in_archive_then_execute() {
    let harness = MarketplaceHarness::new().await;
    let published = harness.publish("Arb", 0.02).await;
    let archive = make_test_zip(&[TestZipEntry::file(
        "output/tx.json",
        br#"{"action":{"target_contract":"0xabc","calldata":"0x01"},"message":"ready"}"#,
    )]);
    harness
        .network
        .script_job(vec![], Ok(completed("0xtask", archive)))
        .await;

    let mut runner = harness.buyer.job_runner();
    let outcome = runner
        .run(&published.listing, TEST_APP, &RunArgs::Steps(vec!["buy".into()]), None)
        .await
        .unwrap();

    let result = outcome.result.outcome;
    assert_eq!(result.preview, "Transaction Ready for Execution");
    assert_eq!(result.summary.as_deref(), Some("ready"));
    assert_eq!(result.filename, "tx.json");
    let action = result.action().expect("structured action");
    assert_eq!(action.target_contract(), Some("0xabc"));
    assert_eq!(action.calldata(), Some("0x01"));

    // "0xabc" is not a full address, so the wallet is never asked to sign.
    let err = execute_action(&harness.buyer_wallet, action).await.unwrap_err();
    assert!(matches!(err, VaultError::Validation(_)));
    assert!(harness.buyer_wallet.sent().is_empty());
}

#[tokio::test]
async fn test_missing_app_order_guidance() {
    let harness = MarketplaceHarness::new().await;
    let published = harness.publish("Momentum", 0.02).await;
    harness
        .network
        .script_job(
            vec![],
            Err("No App order found for app 0xa99 with tag tee,scone".to_string()),
        )
        .await;

    let mut runner = harness.buyer.job_runner();
    let err = runner
        .run(&published.listing, TEST_APP, &RunArgs::Raw(String::new()), None)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("No App order found for app 0xa99"));
    assert!(message.ends_with(
        "The iApp owner must publish an App Order (TEE tagged) on this network so buyers can run it."
    ));
    assert_eq!(runner.phase(), RunPhase::Failed);
}

#[tokio::test]
async fn test_grant_clamps_price_and_volume() {
    let harness = MarketplaceHarness::new().await;
    harness.publish("Momentum", 0.02).await;
    let before = harness.network.grant_requests().await.len();

    harness
        .seller
        .grants
        .grant_once(&harness.seller.grants.plan().unwrap().resource, TEST_APP, "", -5, 0, "")
        .await
        .unwrap();

    let sent = harness.network.grant_requests().await;
    assert_eq!(sent.len(), before + 1);
    let last = sent.last().unwrap();
    assert_eq!(last.price_per_access, 0);
    assert_eq!(last.number_of_access, 1);

    let direct = GrantRequest::new("0xd", TEST_APP, "", -5, 0).unwrap();
    assert_eq!((direct.price_per_access, direct.number_of_access), (0, 1));
}

#[test]
fn test_reconciliation_fresh_wins_hidden_excluded() {
    let make = |addr: &str, title: &str| {
        Listing::builder_with_time(MockTime::new(1))
            .protected_address(addr)
            .title(title)
            .owner(SELLER)
            .build()
            .unwrap()
    };
    let fresh = vec![make("0xA", "A"), make("0xB", "B fresh")];
    let prior = vec![make("0xB", "B prior"), make("0xC", "C")];
    let hidden: BTreeSet<String> = ["0xc".to_string()].into();

    let merged = reconcile_listings(fresh, &prior, &hidden);

    let keys: Vec<String> = merged.iter().map(Listing::key).collect();
    assert_eq!(keys, vec!["0xa", "0xb"]);
    assert_eq!(merged[1].title, "B fresh");
}

#[tokio::test]
async fn test_full_marketplace_flow() {
    let harness = MarketplaceHarness::new().await;

    let published = harness.publish("Momentum", 0.5).await;
    assert_eq!(published.grant, WorkflowResult::Granted { attempts: 1 });
    assert_eq!(published.listing.authorized_app.as_deref(), Some(TEST_APP));

    // The buyer discovers the listing, including its authorized app.
    assert_eq!(refresh_catalog(&harness.buyer).await.unwrap(), 1);
    let listing = harness
        .buyer
        .catalog
        .get(published.listing.protected_address.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(listing.authorized_app.as_deref(), Some(TEST_APP));
    assert_eq!(listing.owner, SELLER);

    let target = format!("0x{}", "12".repeat(20));
    let tx = format!(
        r#"{{"action":{{"target_contract":"{target}","calldata":"0xa9059cbb","value":"0x5"}}}}"#
    );
    harness
        .network
        .script_job(
            vec![
                JobStatusEvent::new("Deal created", true).with_deal_id("0xdeal"),
                JobStatusEvent::new("Task running", false).with_task_id("0xtask"),
            ],
            Ok(JobResponse {
                task_id: None,
                deal_id: None,
                result: Some(tx.into_bytes()),
            }),
        )
        .await;

    let mut runner = harness.buyer.job_runner();
    let outcome = runner
        .run(
            &listing,
            listing.authorized_app.as_deref().unwrap(),
            &RunArgs::Trade { amount: "100".to_string() },
            None,
        )
        .await
        .unwrap();
    assert_eq!(outcome.task_id.as_deref(), Some("0xtask"));
    assert_eq!(
        harness.network.submitted_jobs().await[0].args,
        format!(r#"{{"wallet":"{BUYER}","amount":100}}"#)
    );

    let hash = execute_action(&harness.buyer_wallet, outcome.result.outcome.action().unwrap())
        .await
        .unwrap();
    assert!(hash.starts_with("0x"));
    assert_eq!(harness.buyer_wallet.sent()[0].value, "0x5");

    // Only the owner may delist.
    assert!(delist(&harness.buyer, &listing).await.is_err());
    delist(&harness.seller, &listing).await.unwrap();
    assert_eq!(harness.network.revoked().await.len(), 1);
    assert!(harness.seller.catalog.is_empty().await);
}

#[tokio::test]
async fn test_binary_result_keeps_raw_bytes() {
    let harness = MarketplaceHarness::new().await;
    let published = harness.publish("Momentum", 0.02).await;
    harness
        .network
        .script_job(vec![], Ok(completed("0xtask", vec![0x00, 0xFF, 0x10, 0x80])))
        .await;

    let mut runner = harness.buyer.job_runner();
    let outcome = runner
        .run(&published.listing, TEST_APP, &RunArgs::Raw(String::new()), Some("/iexec_out/model.bin"))
        .await
        .unwrap();

    assert_eq!(outcome.result.outcome.interpretation, Interpretation::Binary);
    assert_eq!(outcome.result.content.filename, "model.bin");
    assert_eq!(outcome.result.content.bytes, vec![0x00, 0xFF, 0x10, 0x80]);
}
