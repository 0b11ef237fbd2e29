//! Result retrieval: inline results, explicit fetch fallback and archive entry selection.

use tradevault::job::{JobResponse, TaskResult};
use tradevault::mocks::{make_test_zip, TestZipEntry};
use tradevault::result::extractor::DEFAULT_ACTION_SUMMARY;
use tradevault::result::ResultSource;
use tradevault::{ContentKind, Interpretation, JobStatusEvent, RunArgs, RunPhase, VaultError};

use crate::common::{MarketplaceHarness, TEST_APP};

fn recommendation_archive() -> Vec<u8> {
    make_test_zip(&[
        TestZipEntry::dir("iexec_out/"),
        TestZipEntry::file("logs/result.json", b"{\"note\": \"not this one\"}"),
        TestZipEntry::file(
            "iexec_out/result.json",
            br#"{"recommendation": {"buy_percent": 60, "sell_percent": 40}}"#,
        ),
    ])
}

#[tokio::test]
async fn test_missing_inline_result_is_fetched_with_captured_task_id() {
    let harness = MarketplaceHarness::new().await;
    let published = harness.publish("Momentum", 0.02).await;
    harness
        .network
        .script_job(
            vec![JobStatusEvent::new("Task running", false).with_task_id("0xcaptured")],
            Ok(JobResponse::default()),
        )
        .await;
    harness
        .network
        .set_task_result(
            "0xcaptured",
            TaskResult {
                result: Some(recommendation_archive()),
            },
        )
        .await;

    let mut runner = harness.buyer.job_runner();
    let outcome = runner
        .run(
            &published.listing,
            TEST_APP,
            &RunArgs::Raw(String::new()),
            Some("/iexec_out/result.json"),
        )
        .await
        .unwrap();

    assert_eq!(
        harness.network.fetch_requests().await,
        vec![(
            "0xcaptured".to_string(),
            Some("/iexec_out/result.json".to_string())
        )]
    );
    let result = outcome.result;
    assert_eq!(result.source, ResultSource::Fetched);
    assert_eq!(result.content.entry_path.as_deref(), Some("iexec_out/result.json"));
    assert_eq!(
        result.outcome.summary.as_deref(),
        Some("Use 60% of your capital to long and 40% to short.")
    );
    assert!(matches!(
        result.outcome.interpretation,
        Interpretation::Recommendation {
            buy_percent: Some(_),
            sell_percent: Some(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_inline_result_skips_fetch() {
    let harness = MarketplaceHarness::new().await;
    let published = harness.publish("Momentum", 0.02).await;
    harness
        .network
        .script_job(
            vec![],
            Ok(JobResponse {
                task_id: Some("0xtask".to_string()),
                deal_id: None,
                result: Some(b"plain log line\n".to_vec()),
            }),
        )
        .await;

    let mut runner = harness.buyer.job_runner();
    let outcome = runner
        .run(&published.listing, TEST_APP, &RunArgs::Raw(String::new()), None)
        .await
        .unwrap();

    assert_eq!(harness.network.fetch_calls().await, 0);
    assert_eq!(outcome.result.source, ResultSource::Inline);
    assert_eq!(outcome.result.outcome.preview, "plain log line\n");
    assert_eq!(outcome.result.outcome.interpretation, Interpretation::UnstructuredText);
    assert_eq!(outcome.result.content.kind, ContentKind::Text);
}

#[tokio::test]
async fn test_corrupt_inline_archive_falls_back_to_fetch() {
    let harness = MarketplaceHarness::new().await;
    let published = harness.publish("Momentum", 0.02).await;
    harness
        .network
        .script_job(
            vec![],
            Ok(JobResponse {
                task_id: Some("0xtask".to_string()),
                deal_id: None,
                result: Some(vec![0x50, 0x4B, 0x03, 0x04, 0xde, 0xad]),
            }),
        )
        .await;
    let tx = br#"{"action": {"target_contract": "0x1", "calldata": "0x02"}}"#;
    harness
        .network
        .set_task_result("0xtask", TaskResult { result: Some(tx.to_vec()) })
        .await;

    let mut runner = harness.buyer.job_runner();
    let outcome = runner
        .run(&published.listing, TEST_APP, &RunArgs::Raw(String::new()), None)
        .await
        .unwrap();

    assert_eq!(outcome.result.source, ResultSource::Fetched);
    assert_eq!(outcome.result.outcome.summary.as_deref(), Some(DEFAULT_ACTION_SUMMARY));
    assert!(outcome.result.outcome.action().is_some());
}

#[tokio::test]
async fn test_no_result_anywhere_fails_the_run() {
    let harness = MarketplaceHarness::new().await;
    let published = harness.publish("Momentum", 0.02).await;
    harness
        .network
        .script_job(
            vec![JobStatusEvent::new("Task running", false).with_task_id("0xtask")],
            Ok(JobResponse::default()),
        )
        .await;
    harness.network.fail_fetch(true).await;

    let mut runner = harness.buyer.job_runner();
    let err = runner
        .run(&published.listing, TEST_APP, &RunArgs::Raw(String::new()), None)
        .await
        .unwrap_err();

    assert!(matches!(err, VaultError::NoResult { .. }));
    assert!(err.to_string().contains("iexec_out"));
    assert_eq!(harness.network.fetch_calls().await, 1);
    assert_eq!(runner.phase(), RunPhase::Failed);
    assert_eq!(runner.progress().task_id.as_deref(), Some("0xtask"));
}

#[tokio::test]
async fn test_no_task_id_means_no_fetch() {
    let harness = MarketplaceHarness::new().await;
    let published = harness.publish("Momentum", 0.02).await;
    harness
        .network
        .script_job(vec![], Ok(JobResponse::default()))
        .await;

    let mut runner = harness.buyer.job_runner();
    let err = runner
        .run(&published.listing, TEST_APP, &RunArgs::Raw(String::new()), None)
        .await
        .unwrap_err();

    assert!(err.is_post_completion());
    assert_eq!(harness.network.fetch_calls().await, 0);
}
