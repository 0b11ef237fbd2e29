//! Mapping of submission failures to actionable messages.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::RESULT_OUTPUT_DIR;

pub const DEFAULT_RUN_FAILURE: &str = "Failed to run iApp. Check inputs and try again.";

pub const APP_ORDER_GUIDANCE: &str =
    " - The iApp owner must publish an App Order (TEE tagged) on this network so buyers can run it.";

static NO_APP_ORDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)No App order found").expect("valid regex"));
static MISSING_RESULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Failed to process task result|no such file|not found").expect("valid regex")
});

/// Category of a submission failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionFailure {
    MissingAppOrder,
    MissingResultFile,
    Other,
}

pub fn categorize(message: &str) -> SubmissionFailure {
    // Order matters: "No App order found" also contains "not found".
    if NO_APP_ORDER.is_match(message) {
        SubmissionFailure::MissingAppOrder
    } else if MISSING_RESULT.is_match(message) {
        SubmissionFailure::MissingResultFile
    } else {
        SubmissionFailure::Other
    }
}

/// Turn a raw submission error message into the message shown to the caller.
pub fn submission_guidance(message: &str) -> String {
    let message = message.trim();
    if message.is_empty() {
        return DEFAULT_RUN_FAILURE.to_string();
    }
    match categorize(message) {
        SubmissionFailure::MissingAppOrder => format!("{message}{APP_ORDER_GUIDANCE}"),
        SubmissionFailure::MissingResultFile => format!(
            "Result processing failed. Ensure your iApp writes a result file inside {RESULT_OUTPUT_DIR}."
        ),
        SubmissionFailure::Other => message.to_string(),
    }
}
