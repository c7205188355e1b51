use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Repository onboarding status
// ---------------------------------------------------------------------------

/// Server-side onboarding state of a connected source repository.
///
/// `Pending` means the backend is still cloning/indexing the repository; the
/// transition to `Success` or `Failed` happens asynchronously server-side and
/// is only ever observed through a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoStatus {
    Pending,
    Success,
    Failed,
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// Repository domain type
// ---------------------------------------------------------------------------

/// A source repository connected to the prediction backend.
///
/// The access credential submitted on create/update is write-only: it is sent
/// once and never part of this type, so it can never leak into display state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    /// Remote URL, `https://<host>/<owner>/<repo>`.
    pub url: String,
    /// Display name derived server-side (usually `owner/repo`).
    #[serde(default)]
    pub name: String,
    pub status: RepoStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
