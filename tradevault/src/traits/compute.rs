//! Confidential-computation network abstraction.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::grant::{GrantOutcome, GrantRequest};
use crate::job::{JobRequest, JobResponse, JobStatusEvent, TaskResult};
use crate::marketplace::PublishedResource;

/// Progress callback handed to long-running network operations.
pub type StatusCallback<'a> = &'a mut (dyn FnMut(JobStatusEvent) + Send);

/// Abstraction over the confidential-computation network client.
///
/// Every operation is opaque: the client owns signing, order matching,
/// encryption and its own timeouts. This trait enables testing of the job
/// and grant workflows without a wallet or a live network.
#[async_trait]
pub trait ComputeNetwork: Send + Sync + Clone {
    /// Submit a job against a protected resource and monitor it to completion.
    ///
    /// Status events are relayed through `on_status` in emission order.
    async fn submit_job(
        &self,
        request: &JobRequest,
        on_status: StatusCallback<'_>,
    ) -> Result<JobResponse>;

    /// Fetch the result of an already completed task.
    ///
    /// # Arguments
    /// * `task_id` - Identifier captured while the job was running
    /// * `path` - Optional path of the entry to extract from the result archive
    async fn fetch_task_result(&self, task_id: &str, path: Option<&str>) -> Result<TaskResult>;

    /// Grant an application/user pair the right to process a protected resource.
    async fn grant_access(
        &self,
        request: &GrantRequest,
        on_status: StatusCallback<'_>,
    ) -> Result<GrantOutcome>;

    /// Revoke every grant on a protected resource.
    async fn revoke_all_access(&self, protected_data: &str) -> Result<()>;

    /// List the protected resources visible to the connected account.
    async fn list_published_resources(&self) -> Result<Vec<PublishedResource>>;

    /// List the access grants recorded for a protected resource.
    async fn list_access_grants(&self, protected_data: &str) -> Result<Vec<GrantOutcome>>;

    /// Encrypt and publish a payload as a new protected resource.
    async fn publish_resource(
        &self,
        name: &str,
        payload: &BTreeMap<String, Vec<u8>>,
    ) -> Result<PublishedResource>;
}
