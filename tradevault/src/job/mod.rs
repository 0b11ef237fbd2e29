//! Job submission, progress tracking and run orchestration.

pub mod guidance;
pub mod orchestrator;
pub mod request;
pub mod status;

pub use guidance::{categorize, submission_guidance, SubmissionFailure};
pub use orchestrator::{JobRunOrchestrator, RunOutcome};
pub use request::{JobRequest, JobResponse, RunArgs, TaskResult};
pub use status::{JobStatusEvent, RunPhase, RunProgress};
