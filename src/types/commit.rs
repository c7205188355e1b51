use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit/push event in the notification feed.
///
/// The feed is append-only and insertion-ordered; items arrive through the
/// paginated `/commits` endpoint and are deduplicated by `id` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitEvent {
    pub id: u64,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub message: String,
    /// Workflow run triggered by this push, once the backend has linked it.
    pub run_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}
