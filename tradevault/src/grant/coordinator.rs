//! Access grant workflows.
//!
//! Both the automatic grant that follows a publish and the manual grant the
//! seller can trigger go through [`AccessGrantCoordinator::start_workflow`],
//! which runs the bounded retry loop. Only one workflow may run at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info, warn};

use super::request::{GrantOutcome, GrantRequest};
use super::retry::{retry_with_delay, RetryOutcome, RetryPolicy};
use crate::config::{DEFAULT_AUTHORIZED_APP, ZERO_ADDRESS};
use crate::error::{VaultError, VaultResult};
use crate::job::JobStatusEvent;
use crate::marketplace::Catalog;
use crate::traits::{ComputeNetwork, TimeProvider, WalletSession};

pub const AUTO_GRANT_PREFIX: &str = "Auto grant";
pub const MANUAL_GRANT_PREFIX: &str = "Manual grant";

pub const SESSION_NOT_READY: &str = "Wallet/provider not ready. Connect your wallet first.";
pub const NOTHING_PUBLISHED: &str = "Protect your strategy first to get its address.";
const DEFAULT_GRANT_FAILURE: &str = "Failed to grant access. Check inputs and try again.";

/// Resource, price and volume the next grant will use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantPlan {
    pub resource: String,
    pub price_nrlc: u64,
    pub volume: u64,
}

/// Observable coordinator state.
#[derive(Debug, Clone, Default)]
pub struct GrantState {
    pub status: String,
    pub error: Option<String>,
    pub plan: Option<GrantPlan>,
    pub last_outcome: Option<GrantOutcome>,
    /// A single grant operation is in flight.
    pub granting: bool,
}

/// Result of starting a grant workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowResult {
    Granted { attempts: u32 },
    Failed { attempts: u32 },
    /// Another workflow was running or there was nothing to grant.
    NotStarted,
}

/// Clears the running flag when the workflow ends, whatever the exit path.
struct WorkflowGuard {
    running: Arc<AtomicBool>,
}

impl WorkflowGuard {
    fn acquire(running: &Arc<AtomicBool>) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                running: Arc::clone(running),
            })
    }
}

impl Drop for WorkflowGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Grants the authorized application access to freshly published resources.
#[derive(Clone)]
pub struct AccessGrantCoordinator<N, S, T>
where
    N: ComputeNetwork,
    S: WalletSession,
    T: TimeProvider,
{
    network: N,
    session: S,
    time: T,
    catalog: Catalog,
    policy: RetryPolicy,
    authorized_app: String,
    running: Arc<AtomicBool>,
    state: Arc<RwLock<GrantState>>,
}

impl<N, S, T> AccessGrantCoordinator<N, S, T>
where
    N: ComputeNetwork,
    S: WalletSession,
    T: TimeProvider,
{
    pub fn new(network: N, session: S, time: T, catalog: Catalog) -> Self {
        Self {
            network,
            session,
            time,
            catalog,
            policy: RetryPolicy::default(),
            authorized_app: DEFAULT_AUTHORIZED_APP.to_string(),
            running: Arc::new(AtomicBool::new(false)),
            state: Arc::new(RwLock::new(GrantState::default())),
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_authorized_app(mut self, app: impl Into<String>) -> Self {
        let app = app.into();
        if !app.trim().is_empty() {
            self.authorized_app = app.trim().to_string();
        }
        self
    }

    pub fn authorized_app(&self) -> &str {
        &self.authorized_app
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn state(&self) -> GrantState {
        self.state.read().clone()
    }

    pub fn status(&self) -> String {
        self.state.read().status.clone()
    }

    pub fn plan(&self) -> Option<GrantPlan> {
        self.state.read().plan.clone()
    }

    fn set_status(&self, status: String) {
        info!("Grant status: {}", status);
        self.state.write().status = status;
    }

    /// Reset status and error, keeping the plan.
    fn reset(&self, status: &str) {
        let mut state = self.state.write();
        state.status = status.to_string();
        state.error = None;
        state.last_outcome = None;
    }

    /// Record the plan for the resource just published.
    pub fn set_plan(&self, resource: &str, price_nrlc: u64, volume: u64) {
        self.state.write().plan = Some(GrantPlan {
            resource: resource.trim().to_string(),
            price_nrlc,
            volume: volume.max(1),
        });
    }

    /// Perform one grant attempt.
    ///
    /// On success the planned price/volume are reconciled with what the
    /// network returned and the application is attached to the listing.
    pub async fn grant_once(
        &self,
        protected_data: &str,
        authorized_app: &str,
        authorized_user: &str,
        price_per_access: i64,
        number_of_access: i64,
        status_prefix: &str,
    ) -> VaultResult<GrantOutcome> {
        if !self.session.is_ready() {
            return Err(VaultError::Precondition(SESSION_NOT_READY.to_string()));
        }
        let request = GrantRequest::new(
            protected_data,
            authorized_app,
            authorized_user,
            price_per_access,
            number_of_access,
        )?;
        let prefix = if status_prefix.is_empty() {
            String::new()
        } else {
            format!("{status_prefix} ")
        };

        {
            let mut state = self.state.write();
            state.granting = true;
            state.error = None;
        }
        self.set_status(format!("{prefix}Requesting wallet signature…"));

        let state = Arc::clone(&self.state);
        let status_prefix = prefix.clone();
        let mut on_status = move |event: JobStatusEvent| {
            let marker = if event.is_done { " ✓" } else { "" };
            let label = format!("{status_prefix}{}{marker}", event.title);
            info!("Grant access status: {}", label);
            state.write().status = label;
        };
        let granted = self.network.grant_access(&request, &mut on_status).await;

        self.state.write().granting = false;

        match granted {
            Ok(outcome) => {
                let price = outcome.effective_price(request.price_per_access);
                let volume = outcome.effective_volume(request.number_of_access);
                {
                    let mut state = self.state.write();
                    state.plan = Some(GrantPlan {
                        resource: request.protected_data.clone(),
                        price_nrlc: price,
                        volume,
                    });
                    state.last_outcome = Some(outcome.clone());
                }
                if !self
                    .catalog
                    .attach_authorized_app(&request.protected_data, &request.authorized_app)
                    .await
                {
                    warn!(
                        "Granted access on {} but no listing matched",
                        request.protected_data
                    );
                }
                self.set_status(format!("{prefix}Access granted ✓"));
                Ok(outcome)
            }
            Err(e) => {
                let message = match e.to_string() {
                    m if m.trim().is_empty() => DEFAULT_GRANT_FAILURE.to_string(),
                    m => m,
                };
                self.state.write().error = Some(message.clone());
                Err(VaultError::Grant(message))
            }
        }
    }

    /// Run the retried grant workflow for `resource`.
    ///
    /// Returns [`WorkflowResult::NotStarted`] when another workflow is active
    /// or `resource` is blank. Failures never escape beyond the status.
    pub async fn start_workflow(
        &self,
        resource: &str,
        prefix: &str,
        price_per_access: i64,
        number_of_access: i64,
    ) -> WorkflowResult {
        let resource = resource.trim();
        if resource.is_empty() {
            return WorkflowResult::NotStarted;
        }
        let Some(guard) = self.try_begin(prefix) else {
            return WorkflowResult::NotStarted;
        };
        self.run_guarded(guard, resource, prefix, price_per_access, number_of_access)
            .await
    }

    /// Claim the running flag, or `None` if a workflow or a single grant is in flight.
    fn try_begin(&self, prefix: &str) -> Option<WorkflowGuard> {
        if self.state.read().granting {
            info!("{} skipped: a grant is in flight", prefix);
            return None;
        }
        let guard = WorkflowGuard::acquire(&self.running);
        if guard.is_none() {
            info!("{} skipped: a grant workflow is already running", prefix);
        }
        guard
    }

    async fn run_guarded(
        &self,
        _guard: WorkflowGuard,
        resource: &str,
        prefix: &str,
        price_per_access: i64,
        number_of_access: i64,
    ) -> WorkflowResult {
        let max_attempts = self.policy.max_attempts.max(1);
        let outcome = retry_with_delay(
            self.policy,
            &self.time,
            |attempt| {
                let status_prefix = if max_attempts > 1 {
                    format!("{prefix} (attempt {attempt}/{max_attempts})")
                } else {
                    prefix.to_string()
                };
                async move {
                    self.grant_once(
                        resource,
                        &self.authorized_app,
                        ZERO_ADDRESS,
                        price_per_access,
                        number_of_access,
                        &status_prefix,
                    )
                    .await
                }
            },
            |attempt, err, will_retry| {
                error!("{} attempt {} failed: {}", prefix, attempt, err);
                if will_retry {
                    self.set_status(format!("{prefix} attempt {attempt} failed. Retrying…"));
                } else {
                    self.set_status(format!("{prefix} failed after {max_attempts} attempts."));
                }
            },
        )
        .await;

        match outcome {
            RetryOutcome::Succeeded { attempts, .. } => {
                info!("{} succeeded after {} attempt(s)", prefix, attempts);
                WorkflowResult::Granted { attempts }
            }
            RetryOutcome::Exhausted { attempts, .. } => WorkflowResult::Failed { attempts },
        }
    }

    /// Grant access right after `resource` was published.
    ///
    /// Leaves plan and status untouched when another workflow is running.
    pub async fn auto_grant_after_publish(
        &self,
        resource: &str,
        price_nrlc: u64,
        volume: u64,
    ) -> WorkflowResult {
        let resource = resource.trim();
        if resource.is_empty() {
            return WorkflowResult::NotStarted;
        }
        let Some(guard) = self.try_begin(AUTO_GRANT_PREFIX) else {
            return WorkflowResult::NotStarted;
        };
        self.set_plan(resource, price_nrlc, volume);
        self.reset("Auto grant scheduled…");
        self.run_guarded(
            guard,
            resource,
            AUTO_GRANT_PREFIX,
            saturating_i64(price_nrlc),
            saturating_i64(volume),
        )
        .await
    }

    /// Re-run the grant for the resource published in this session.
    pub async fn manual_grant(&self) -> VaultResult<WorkflowResult> {
        if !self.session.is_ready() {
            return Err(VaultError::Precondition(SESSION_NOT_READY.to_string()));
        }
        let plan = self
            .plan()
            .filter(|p| !p.resource.is_empty())
            .ok_or_else(|| VaultError::Precondition(NOTHING_PUBLISHED.to_string()))?;
        let Some(guard) = self.try_begin(MANUAL_GRANT_PREFIX) else {
            return Ok(WorkflowResult::NotStarted);
        };
        self.reset("Manual grant scheduled…");
        Ok(self
            .run_guarded(
                guard,
                &plan.resource,
                MANUAL_GRANT_PREFIX,
                saturating_i64(plan.price_nrlc),
                saturating_i64(plan.volume),
            )
            .await)
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
