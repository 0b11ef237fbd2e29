pub mod actions;
pub mod config;
pub mod error;
pub mod grant;
pub mod job;
pub mod marketplace;
pub mod result;
pub mod shared_state;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use config::*;
pub use error::{VaultError, VaultResult};
pub use grant::{AccessGrantCoordinator, GrantOutcome, GrantPlan, GrantRequest, RetryPolicy, WorkflowResult};
pub use job::{JobRequest, JobResponse, JobRunOrchestrator, JobStatusEvent, RunArgs, RunOutcome, RunPhase};
pub use marketplace::{reconcile_listings, Catalog, HiddenSet, Listing, PublishedResource};
pub use result::{
    classify, ClassifiedContent, ContentKind, ExecutableAction, ExtractedOutcome, Interpretation,
    ResultBundle, ResultRetriever,
};
pub use shared_state::SharedAppState;
pub use traits::{
    ComputeNetwork, JsonFileStore, KeyValueStore, SystemTimeProvider, TimeProvider, TransactionRequest,
    WalletSession,
};
