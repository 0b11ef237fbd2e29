//! Result retrieval for completed jobs.

use tracing::{debug, info, warn};

use super::classifier::{classify, ClassifiedContent, ResultBundle};
use super::extractor::ExtractedOutcome;
use crate::error::{VaultError, VaultResult};
use crate::job::JobResponse;
use crate::traits::ComputeNetwork;

/// Where the result bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    /// Carried by the job response itself.
    Inline,
    /// Fetched by task identifier after the inline attempt failed.
    Fetched,
}

#[derive(Debug, Clone)]
pub struct RetrievedResult {
    pub source: ResultSource,
    pub content: ClassifiedContent,
    pub outcome: ExtractedOutcome,
}

/// Classify and interpret one buffer. Empty input and decode failures yield `None`.
pub fn interpret_result(bundle: &ResultBundle) -> Option<(ClassifiedContent, ExtractedOutcome)> {
    if bundle.bytes.is_empty() {
        return None;
    }
    match classify(bundle) {
        Ok(content) => {
            let outcome = ExtractedOutcome::from_content(&content);
            Some((content, outcome))
        }
        Err(e) => {
            warn!("Failed to decode result buffer: {}", e);
            None
        }
    }
}

/// Obtains the result of a completed job: inline first, then one explicit fetch.
#[derive(Clone)]
pub struct ResultRetriever<N: ComputeNetwork> {
    network: N,
}

impl<N: ComputeNetwork> ResultRetriever<N> {
    pub const fn new(network: N) -> Self {
        Self { network }
    }

    /// Resolve the result of a completed job.
    ///
    /// `captured_task_id` is used when the response does not carry its own
    /// task identifier. Fetch failures are logged, never propagated; when
    /// nothing usable is found the error is [`VaultError::NoResult`].
    pub async fn retrieve(
        &self,
        response: &JobResponse,
        captured_task_id: Option<&str>,
        path_hint: Option<&str>,
    ) -> VaultResult<RetrievedResult> {
        if let Some(bytes) = response.result.as_ref() {
            let bundle = ResultBundle::new(bytes.clone(), path_hint);
            if let Some((content, outcome)) = interpret_result(&bundle) {
                info!("Resolved result inline ({} bytes)", bundle.bytes.len());
                return Ok(RetrievedResult {
                    source: ResultSource::Inline,
                    content,
                    outcome,
                });
            }
        }

        let task_id = response
            .task_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| captured_task_id.filter(|id| !id.is_empty()));

        let Some(task_id) = task_id else {
            warn!("No inline result and no task id to fetch with");
            return Err(VaultError::no_result());
        };

        debug!("Fetching result for task {}", task_id);
        match self.network.fetch_task_result(task_id, path_hint).await {
            Ok(fetched) => {
                let bundle = ResultBundle::new(fetched.result.unwrap_or_default(), path_hint);
                if let Some((content, outcome)) = interpret_result(&bundle) {
                    info!("Resolved result for task {} by explicit fetch", task_id);
                    return Ok(RetrievedResult {
                        source: ResultSource::Fetched,
                        content,
                        outcome,
                    });
                }
                warn!("Fetched result for task {} held no usable entry", task_id);
            }
            Err(e) => warn!("Explicit result fetch failed for task {}: {}", task_id, e),
        }

        Err(VaultError::no_result())
    }
}
