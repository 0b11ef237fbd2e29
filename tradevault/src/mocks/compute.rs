//! Mock confidential-computation network for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::{Notify, RwLock};

use crate::grant::{GrantOutcome, GrantRequest};
use crate::job::{JobRequest, JobResponse, JobStatusEvent, TaskResult};
use crate::marketplace::PublishedResource;
use crate::traits::{ComputeNetwork, StatusCallback};

/// One scripted job: status events to emit, then the response (or error message).
#[derive(Debug, Clone)]
struct ScriptedJob {
    events: Vec<JobStatusEvent>,
    response: std::result::Result<JobResponse, String>,
}

#[derive(Debug, Default)]
struct MockComputeInner {
    jobs: RwLock<Vec<ScriptedJob>>,
    submitted: RwLock<Vec<JobRequest>>,
    task_results: RwLock<HashMap<String, TaskResult>>,
    fetches: RwLock<Vec<(String, Option<String>)>>,
    fail_fetch: RwLock<bool>,
    grant_outcome: RwLock<GrantOutcome>,
    grant_requests: RwLock<Vec<GrantRequest>>,
    /// Number of upcoming grant calls that fail.
    grant_failures: RwLock<u32>,
    grant_gate: RwLock<Option<Arc<Notify>>>,
    revoked: RwLock<Vec<String>>,
    fail_revoke: RwLock<bool>,
    resources: RwLock<Vec<PublishedResource>>,
    grants: RwLock<HashMap<String, Vec<GrantOutcome>>>,
    fail_listing: RwLock<bool>,
    published: RwLock<Vec<(String, BTreeMap<String, Vec<u8>>)>>,
    fail_publish: RwLock<bool>,
    owner: RwLock<String>,
    next_id: AtomicU64,
}

/// Mock network client.
///
/// Clones share state, so a test keeps one handle for scripting and
/// inspection while the code under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MockComputeNetwork {
    inner: Arc<MockComputeInner>,
}

impl MockComputeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a job: `events` are emitted in order, then `response` is returned.
    ///
    /// With nothing queued a submission succeeds with no identifiers and no result.
    pub async fn script_job(
        &self,
        events: Vec<JobStatusEvent>,
        response: std::result::Result<JobResponse, String>,
    ) {
        self.inner
            .jobs
            .write()
            .await
            .push(ScriptedJob { events, response });
    }

    pub async fn submit_calls(&self) -> usize {
        self.inner.submitted.read().await.len()
    }

    pub async fn submitted_jobs(&self) -> Vec<JobRequest> {
        self.inner.submitted.read().await.clone()
    }

    pub async fn set_task_result(&self, task_id: &str, result: TaskResult) {
        self.inner
            .task_results
            .write()
            .await
            .insert(task_id.to_string(), result);
    }

    pub async fn fail_fetch(&self, fail: bool) {
        *self.inner.fail_fetch.write().await = fail;
    }

    pub async fn fetch_calls(&self) -> usize {
        self.inner.fetches.read().await.len()
    }

    pub async fn fetch_requests(&self) -> Vec<(String, Option<String>)> {
        self.inner.fetches.read().await.clone()
    }

    pub async fn set_grant_outcome(&self, outcome: GrantOutcome) {
        *self.inner.grant_outcome.write().await = outcome;
    }

    /// Make the next `count` grant calls fail.
    pub async fn fail_grants(&self, count: u32) {
        *self.inner.grant_failures.write().await = count;
    }

    /// Hold every later grant call after its first status event until the returned handle is notified.
    pub async fn gate_grants(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.inner.grant_gate.write().await = Some(Arc::clone(&gate));
        gate
    }

    pub async fn grant_requests(&self) -> Vec<GrantRequest> {
        self.inner.grant_requests.read().await.clone()
    }

    pub async fn fail_revoke(&self, fail: bool) {
        *self.inner.fail_revoke.write().await = fail;
    }

    pub async fn revoked(&self) -> Vec<String> {
        self.inner.revoked.read().await.clone()
    }

    pub async fn add_resource(&self, resource: PublishedResource) {
        self.inner.resources.write().await.push(resource);
    }

    pub async fn add_grant(&self, protected_data: &str, grant: GrantOutcome) {
        self.inner
            .grants
            .write()
            .await
            .entry(protected_data.to_lowercase())
            .or_default()
            .push(grant);
    }

    pub async fn fail_listing(&self, fail: bool) {
        *self.inner.fail_listing.write().await = fail;
    }

    pub async fn fail_publish(&self, fail: bool) {
        *self.inner.fail_publish.write().await = fail;
    }

    /// Owner reported for published resources.
    pub async fn set_owner(&self, owner: &str) {
        *self.inner.owner.write().await = owner.to_string();
    }

    pub async fn published(&self) -> Vec<(String, BTreeMap<String, Vec<u8>>)> {
        self.inner.published.read().await.clone()
    }
}

/// Deterministic 20-byte hex address for mock resources.
pub fn make_test_address(id: u64) -> String {
    format!("0x{id:040x}")
}

#[async_trait]
impl ComputeNetwork for MockComputeNetwork {
    async fn submit_job(
        &self,
        request: &JobRequest,
        on_status: StatusCallback<'_>,
    ) -> Result<JobResponse> {
        self.inner.submitted.write().await.push(request.clone());
        let scripted = {
            let mut jobs = self.inner.jobs.write().await;
            (!jobs.is_empty()).then(|| jobs.remove(0))
        };
        let Some(job) = scripted else {
            return Ok(JobResponse::default());
        };
        for event in job.events {
            on_status(event);
        }
        job.response.map_err(|msg| anyhow!(msg))
    }

    async fn fetch_task_result(&self, task_id: &str, path: Option<&str>) -> Result<TaskResult> {
        self.inner
            .fetches
            .write()
            .await
            .push((task_id.to_string(), path.map(str::to_string)));
        if *self.inner.fail_fetch.read().await {
            return Err(anyhow!("Mock fetch failure for task {task_id}"));
        }
        self.inner
            .task_results
            .read()
            .await
            .get(task_id)
            .cloned()
            .ok_or_else(|| anyhow!("Task {task_id} has no result"))
    }

    async fn grant_access(
        &self,
        request: &GrantRequest,
        on_status: StatusCallback<'_>,
    ) -> Result<GrantOutcome> {
        self.inner.grant_requests.write().await.push(request.clone());
        on_status(JobStatusEvent::new("Creating dataset order", false));
        let gate = self.inner.grant_gate.read().await.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        {
            let mut failures = self.inner.grant_failures.write().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(anyhow!("Dataset {} is not yet indexed", request.protected_data));
            }
        }
        on_status(JobStatusEvent::new("Publishing dataset order", true));
        let mut outcome = self.inner.grant_outcome.read().await.clone();
        outcome.dataset.get_or_insert_with(|| request.protected_data.clone());
        outcome
            .app_restrict
            .get_or_insert_with(|| request.authorized_app.clone());
        self.inner
            .grants
            .write()
            .await
            .entry(request.protected_data.to_lowercase())
            .or_default()
            .push(outcome.clone());
        Ok(outcome)
    }

    async fn revoke_all_access(&self, protected_data: &str) -> Result<()> {
        if *self.inner.fail_revoke.read().await {
            return Err(anyhow!("Mock revoke failure"));
        }
        self.inner
            .revoked
            .write()
            .await
            .push(protected_data.to_string());
        Ok(())
    }

    async fn list_published_resources(&self) -> Result<Vec<PublishedResource>> {
        if *self.inner.fail_listing.read().await {
            return Err(anyhow!("Mock listing failure"));
        }
        Ok(self.inner.resources.read().await.clone())
    }

    async fn list_access_grants(&self, protected_data: &str) -> Result<Vec<GrantOutcome>> {
        Ok(self
            .inner
            .grants
            .read()
            .await
            .get(&protected_data.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn publish_resource(
        &self,
        name: &str,
        payload: &BTreeMap<String, Vec<u8>>,
    ) -> Result<PublishedResource> {
        if *self.inner.fail_publish.read().await {
            return Err(anyhow!("Mock publish failure"));
        }
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let resource = PublishedResource {
            address: make_test_address(id),
            name: Some(name.to_string()),
            owner: self.inner.owner.read().await.clone(),
            schema: payload
                .keys()
                .map(|k| (k.clone(), serde_json::Value::String("application/zip".into())))
                .collect(),
        };
        self.inner
            .published
            .write()
            .await
            .push((name.to_string(), payload.clone()));
        self.inner.resources.write().await.push(resource.clone());
        Ok(resource)
    }
}
