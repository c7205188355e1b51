use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WorkflowRun-specific enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunConclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    Skipped,
    Stale,
    ActionRequired,
    TimedOut,
    StartupFailure,
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// WorkflowRun domain type
// ---------------------------------------------------------------------------

/// A CI workflow run mirrored from the backend.
///
/// Immutable from the client's perspective: a rerun never mutates this row in
/// place, it eventually produces a new row observed on the next poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    /// Workflow file name / workflow display name.
    #[serde(default)]
    pub name: String,
    pub status: RunStatus,
    pub conclusion: Option<RunConclusion>,
    pub head_branch: Option<String>,
    #[serde(default)]
    pub head_sha: String,
    #[serde(default)]
    pub run_number: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
