use serde_json::json;

use crate::backend::ApiClient;
use crate::error::Error;

/// Moderation verdict on a mismatch report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    Approve,
    Reject,
}

impl ReportAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

/// Apply a moderation action to the mismatch report of a run.
pub async fn moderate(api: &ApiClient, run_id: u64, action: ReportAction) -> Result<(), Error> {
    let payload = json!({ "action": action.as_str() });
    api.post_ok(&format!("/report/{run_id}/action"), &[], Some(&payload))
        .await
}

/// Discard the mismatch report of a run.
pub async fn delete(api: &ApiClient, run_id: u64) -> Result<(), Error> {
    api.delete_ok(&format!("/report/{run_id}"), &[]).await
}
