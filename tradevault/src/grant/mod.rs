//! Access grants on protected resources.

pub mod coordinator;
pub mod request;
pub mod retry;

pub use coordinator::{AccessGrantCoordinator, GrantPlan, GrantState, WorkflowResult};
pub use request::{GrantOutcome, GrantRequest};
pub use retry::{retry_with_delay, RetryOutcome, RetryPolicy};
