/// Domain-specific error types for the marketplace library.
///
/// Each variant corresponds to one failure category the workflows report to
/// the caller. Lower-level errors from the network client, the archive
/// reader or local storage are converted at component boundaries.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// A required input or session was missing; nothing was submitted.
    #[error("{0}")]
    Precondition(String),

    /// Job submission or negotiation failed (message already carries guidance).
    #[error("{0}")]
    Submission(String),

    /// The job completed but no usable result file could be retrieved.
    #[error("Run completed but no result file was retrieved. Ensure your iApp writes a result file into {output_dir}.")]
    NoResult { output_dir: String },

    #[error("Grant failed: {0}")]
    Grant(String),

    #[error("Decoding failed: {0}")]
    Decode(String),

    #[error("Storage operation failed: {0}")]
    Storage(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Network operation failed: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VaultError {
    /// The "no result retrieved" error pointing at the designated output directory.
    pub fn no_result() -> Self {
        Self::NoResult {
            output_dir: crate::config::RESULT_OUTPUT_DIR.to_string(),
        }
    }

    /// Whether the job itself already ran (and may have been paid for).
    pub const fn is_post_completion(&self) -> bool {
        matches!(self, Self::NoResult { .. })
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<zip::result::ZipError> for VaultError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Convenience type alias.
pub type VaultResult<T> = Result<T, VaultError>;
