//! Job run orchestration.
//!
//! A [`JobRunOrchestrator`] drives one run at a time: it validates the
//! preconditions, submits the request, relays status events, and hands the
//! completed job to the [`ResultRetriever`].

use tracing::{debug, error, info, warn};

use super::guidance::submission_guidance;
use super::request::{JobRequest, RunArgs};
use super::status::{JobStatusEvent, RunPhase, RunProgress};
use crate::config::{explorer_task_url, DEFAULT_EXPLORER_SLUG};
use crate::error::{VaultError, VaultResult};
use crate::marketplace::Listing;
use crate::result::{ResultRetriever, RetrievedResult};
use crate::traits::{ComputeNetwork, WalletSession};

pub const RUN_COMPLETED_LABEL: &str = "iApp run completed ✓";

pub const MISSING_SESSION: &str = "Connect your wallet before running a strategy.";
pub const MISSING_PROTECTED_DATA: &str = "This listing has no protected data address.";
pub const MISSING_APP: &str = "Provide the authorized iApp address to run.";

/// Identifiers and interpreted result of a successful run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub task_id: Option<String>,
    pub deal_id: Option<String>,
    /// Explorer page of the task, when a task id was captured.
    pub task_url: Option<String>,
    pub result: RetrievedResult,
}

/// Drives a single job run against a listing.
///
/// The orchestrator owns the run state; a fresh instance (or a new call to
/// [`run`](Self::run)) starts from `Idle`. Closing the caller's view does not
/// cancel the remote job.
pub struct JobRunOrchestrator<N: ComputeNetwork, S: WalletSession> {
    network: N,
    session: S,
    retriever: ResultRetriever<N>,
    explorer_slug: String,
    phase: RunPhase,
    progress: RunProgress,
    last_error: Option<String>,
}

impl<N: ComputeNetwork, S: WalletSession> JobRunOrchestrator<N, S> {
    pub fn new(network: N, session: S) -> Self {
        Self {
            retriever: ResultRetriever::new(network.clone()),
            network,
            session,
            explorer_slug: DEFAULT_EXPLORER_SLUG.to_string(),
            phase: RunPhase::Idle,
            progress: RunProgress::default(),
            last_error: None,
        }
    }

    #[must_use]
    pub fn with_explorer_slug(mut self, slug: impl Into<String>) -> Self {
        self.explorer_slug = slug.into();
        self
    }

    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    pub const fn progress(&self) -> &RunProgress {
        &self.progress
    }

    /// Current status label.
    pub fn status(&self) -> &str {
        &self.progress.label
    }

    /// Message of the last failure, if the last run failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn set_phase(&mut self, phase: RunPhase) {
        if self.phase == phase {
            return;
        }
        if phase.is_terminal() {
            info!("Run finished: {:?} -> {:?}", self.phase, phase);
        } else {
            debug!("Run phase {:?} -> {:?}", self.phase, phase);
        }
        self.phase = phase;
    }

    fn fail(&mut self, phase: RunPhase, err: VaultError) -> VaultError {
        self.set_phase(phase);
        self.last_error = Some(err.to_string());
        err
    }

    fn validate<'a>(&self, listing: &'a Listing, app: &'a str) -> VaultResult<(&'a str, &'a str)> {
        if !self.session.is_ready() {
            return Err(VaultError::Precondition(MISSING_SESSION.to_string()));
        }
        let protected = listing
            .protected_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| VaultError::Precondition(MISSING_PROTECTED_DATA.to_string()))?;
        let app = app.trim();
        if app.is_empty() {
            return Err(VaultError::Precondition(MISSING_APP.to_string()));
        }
        Ok((protected, app))
    }

    /// Run the authorized application against `listing`.
    ///
    /// Precondition failures return [`VaultError::Precondition`] before
    /// anything is submitted. Submission failures return
    /// [`VaultError::Submission`] carrying guidance. A completed job without
    /// a usable result returns [`VaultError::NoResult`].
    pub async fn run(
        &mut self,
        listing: &Listing,
        app: &str,
        args: &RunArgs,
        result_path: Option<&str>,
    ) -> VaultResult<RunOutcome> {
        self.phase = RunPhase::Idle;
        self.progress = RunProgress::default();
        self.last_error = None;
        self.set_phase(RunPhase::Validating);

        let (protected, app) = match self.validate(listing, app) {
            Ok(ok) => ok,
            Err(e) => {
                warn!("Run rejected: {}", e);
                return Err(self.fail(RunPhase::Rejected, e));
            }
        };

        let wallet = self.session.address().unwrap_or_default();
        let request = JobRequest::new(protected, app, args.encode(&wallet), result_path);
        info!(
            "Submitting job for {} with app {} (args: {} bytes)",
            request.protected_data,
            request.app,
            request.args.len()
        );
        self.set_phase(RunPhase::Submitted);

        let progress = &mut self.progress;
        let mut on_status = |event: JobStatusEvent| {
            info!(
                "Job status: {}{}",
                event.title,
                if event.is_done { " (done)" } else { "" }
            );
            progress.apply(&event);
        };
        let submitted = self.network.submit_job(&request, &mut on_status).await;

        let response = match submitted {
            Ok(response) => response,
            Err(e) => {
                error!("Run failed: {:#}", e);
                let message = submission_guidance(&e.to_string());
                return Err(self.fail(RunPhase::Failed, VaultError::Submission(message)));
            }
        };

        self.progress
            .settle(response.task_id.as_deref(), response.deal_id.as_deref());
        self.set_phase(RunPhase::Completed);

        let retrieved = self
            .retriever
            .retrieve(&response, self.progress.task_id.as_deref(), request.path.as_deref())
            .await;
        self.progress.label = RUN_COMPLETED_LABEL.to_string();

        match retrieved {
            Ok(result) => {
                self.set_phase(RunPhase::ResultResolved);
                let task_url = self
                    .progress
                    .task_id
                    .as_deref()
                    .map(|id| explorer_task_url(&self.explorer_slug, id));
                Ok(RunOutcome {
                    task_id: self.progress.task_id.clone(),
                    deal_id: self.progress.deal_id.clone(),
                    task_url,
                    result,
                })
            }
            Err(e) => {
                warn!("Run completed without a usable result: {}", e);
                Err(self.fail(RunPhase::Failed, e))
            }
        }
    }
}
