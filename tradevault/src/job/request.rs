//! Job requests and the argument encodings handed to the remote application.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{MAX_RUN_STEPS, UNLIMITED_PRICE};

/// Request to run an authorized application against a protected resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub protected_data: String,
    pub app: String,
    /// Opaque argument string handed to the application.
    pub args: String,
    /// Path of the result entry to extract, if the caller expects one.
    pub path: Option<String>,
    pub data_max_price: u64,
    pub app_max_price: u64,
    pub workerpool_max_price: u64,
    pub encrypt_result: bool,
}

impl JobRequest {
    /// Build a request with unlimited price ceilings.
    pub fn new(protected_data: &str, app: &str, args: String, path: Option<&str>) -> Self {
        Self {
            protected_data: protected_data.trim().to_string(),
            app: app.trim().to_string(),
            args,
            path: path
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            data_max_price: UNLIMITED_PRICE,
            app_max_price: UNLIMITED_PRICE,
            workerpool_max_price: UNLIMITED_PRICE,
            encrypt_result: true,
        }
    }
}

/// Identifiers and optional inline result of a finished job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub task_id: Option<String>,
    pub deal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<u8>>,
}

/// Result bytes fetched for an already completed task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskResult {
    pub result: Option<Vec<u8>>,
}

/// Arguments passed to the remote application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunArgs {
    /// Ordered strategy steps, encoded as `{"steps":[...]}`.
    Steps(Vec<String>),
    /// Trade sizing for the buyer's wallet, encoded as `{"wallet":...,"amount":...}`.
    Trade { amount: String },
    /// Passed through verbatim.
    Raw(String),
}

impl RunArgs {
    /// Encode the arguments. `wallet` is the connected address (used by `Trade`).
    pub fn encode(&self, wallet: &str) -> String {
        match self {
            Self::Steps(steps) => {
                let steps: Vec<&str> = steps
                    .iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .take(MAX_RUN_STEPS)
                    .collect();
                if steps.is_empty() {
                    String::new()
                } else {
                    json!({ "steps": steps }).to_string()
                }
            }
            Self::Trade { amount } => {
                let amount = amount.trim();
                let amount = serde_json::from_str::<Value>(amount)
                    .unwrap_or_else(|_| Value::String(amount.to_string()));
                // Wallet first; `json!` sorts keys.
                format!(r#"{{"wallet":{},"amount":{}}}"#, Value::from(wallet), amount)
            }
            Self::Raw(raw) => raw.clone(),
        }
    }
}
