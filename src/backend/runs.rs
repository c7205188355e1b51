use crate::backend::ApiClient;
use crate::error::Error;
use crate::types::WorkflowRun;

// ---------------------------------------------------------------------------
// Workflow run endpoints
// ---------------------------------------------------------------------------

/// Server-side query parameters for the run collection.
#[derive(Debug, Clone, Default)]
pub struct RunQuery {
    pub workflow_id: Option<u64>,
    pub branch: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl RunQuery {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(workflow_id) = self.workflow_id {
            query.push(("workflow_id", workflow_id.to_string()));
        }
        if let Some(ref branch) = self.branch {
            query.push(("branch", branch.clone()));
        }
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            query.push(("per_page", per_page.to_string()));
        }
        query
    }
}

/// Fetch the run collection, filtered and paginated server-side.
pub async fn list(api: &ApiClient, query: &RunQuery) -> Result<Vec<WorkflowRun>, Error> {
    api.get_json("/workflow_run/runs", &query.to_query()).await
}

pub async fn get(api: &ApiClient, id: u64) -> Result<WorkflowRun, Error> {
    api.get_json(&format!("/workflow_run/runs/{id}"), &[]).await
}

/// Trigger a rerun. The response does not mutate the original run — the new
/// run row appears in a later poll.
pub async fn rerun(api: &ApiClient, id: u64) -> Result<(), Error> {
    api.post_ok(
        &format!("/workflow_run/runs/{id}/rerun"),
        &[("user_id", api.user_id().to_owned())],
        None,
    )
    .await
}
