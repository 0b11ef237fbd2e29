//! Job status events and the run lifecycle.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Progress notification emitted while a job runs. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusEvent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_done: bool,
    pub task_id: Option<String>,
    pub deal_id: Option<String>,
}

impl JobStatusEvent {
    pub fn new(title: impl Into<String>, is_done: bool) -> Self {
        Self {
            title: title.into(),
            is_done,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    #[must_use]
    pub fn with_deal_id(mut self, deal_id: impl Into<String>) -> Self {
        self.deal_id = Some(deal_id.into());
        self
    }
}

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    Validating,
    Submitted,
    Completed,
    ResultResolved,
    Rejected,
    Failed,
}

impl RunPhase {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ResultResolved | Self::Rejected | Self::Failed)
    }
}

/// Marker appended to a status label once its step is done.
pub const DONE_MARKER: &str = " ✓";

/// Running status label plus the identifiers captured so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProgress {
    pub label: String,
    pub task_id: Option<String>,
    pub deal_id: Option<String>,
    pub events_seen: usize,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl RunProgress {
    /// Apply one status event. Captured identifiers are never cleared.
    pub fn apply(&mut self, event: &JobStatusEvent) {
        self.events_seen += 1;
        if !event.title.is_empty() {
            self.label = if event.is_done {
                format!("{}{DONE_MARKER}", event.title)
            } else {
                event.title.clone()
            };
        }
        if let Some(task_id) = non_empty(event.task_id.as_deref()) {
            if self.task_id.as_deref() != Some(task_id) {
                debug!("Captured task id {}", task_id);
                self.task_id = Some(task_id.to_string());
            }
        }
        if let Some(deal_id) = non_empty(event.deal_id.as_deref()) {
            if self.deal_id.as_deref() != Some(deal_id) {
                debug!("Captured deal id {}", deal_id);
                self.deal_id = Some(deal_id.to_string());
            }
        }
    }

    /// Take the authoritative identifiers of the completed job when present.
    pub fn settle(&mut self, task_id: Option<&str>, deal_id: Option<&str>) {
        if let Some(task_id) = non_empty(task_id) {
            self.task_id = Some(task_id.to_string());
        }
        if let Some(deal_id) = non_empty(deal_id) {
            self.deal_id = Some(deal_id.to_string());
        }
    }
}
