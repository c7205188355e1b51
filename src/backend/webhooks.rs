use serde_json::json;

use crate::backend::ApiClient;
use crate::error::Error;
use crate::types::Webhook;

// ---------------------------------------------------------------------------
// Webhook endpoints
// ---------------------------------------------------------------------------

/// List webhook configurations for all of the user's repositories.
pub async fn list(api: &ApiClient) -> Result<Vec<Webhook>, Error> {
    api.get_json("/webhooks/list", &[("user_id", api.user_id().to_owned())])
        .await
}

/// Fetch the current webhook state for one repository.
pub async fn check(api: &ApiClient, repo_id: u64) -> Result<Webhook, Error> {
    api.get_json("/webhooks/check", &[("repo_id", repo_id.to_string())])
        .await
}

/// Configure a webhook. The secret is forwarded once and never retained
/// client-side. The returned entity is normally `Pending` — delivery is
/// verified asynchronously server-side and observed through a later poll.
pub async fn configure(api: &ApiClient, repo_id: u64, secret: &str) -> Result<Webhook, Error> {
    let payload = json!({ "repo_id": repo_id, "secret": secret });
    api.post_json("/webhooks/configure", &[], &payload).await
}

/// Rotate the secret of an existing webhook.
pub async fn update(api: &ApiClient, repo_id: u64, secret: &str) -> Result<Webhook, Error> {
    let payload = json!({ "repo_id": repo_id, "secret": secret });
    api.post_json("/webhooks/update", &[], &payload).await
}

pub async fn delete(api: &ApiClient, repo_id: u64) -> Result<(), Error> {
    let payload = json!({ "repo_id": repo_id });
    api.post_ok("/webhooks/delete", &[], Some(&payload)).await
}

/// Ask the backend to re-sync the repository from its source immediately.
pub async fn trigger_sync(api: &ApiClient, repo_id: u64) -> Result<(), Error> {
    let payload = json!({ "repo_id": repo_id });
    api.post_ok("/webhooks/trigger-sync", &[], Some(&payload))
        .await
}
