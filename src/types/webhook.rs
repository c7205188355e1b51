use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Webhook configuration status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    Unconfigured,
    Pending,
    Configured,
    Failed,
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// Webhook domain type
// ---------------------------------------------------------------------------

/// Webhook configuration, one-to-one with a repository.
///
/// The secret submitted on configure/update is write-only and never part of
/// this type. Event set and delivery URL are server-defined and read-only;
/// the client renders them but never edits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    /// Identity: the owning repository's id.
    pub repo_id: u64,
    pub status: WebhookStatus,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub delivery_url: String,
    /// Last server-side state change. Drives the pending-expiry policy.
    pub updated_at: DateTime<Utc>,
}
