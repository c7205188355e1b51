use serde_json::json;

use crate::backend::ApiClient;
use crate::error::Error;
use crate::types::Repository;

// ---------------------------------------------------------------------------
// Repository endpoints
// ---------------------------------------------------------------------------

/// List the user's connected repositories.
pub async fn list(api: &ApiClient) -> Result<Vec<Repository>, Error> {
    api.get_json("/repos", &[("user_id", api.user_id().to_owned())])
        .await
}

/// Connect a new repository. The access token is forwarded once and never
/// retained client-side.
pub async fn create(api: &ApiClient, url: &str, token: &str) -> Result<Repository, Error> {
    let payload = json!({ "url": url, "token": token });
    api.post_json(
        "/repos",
        &[("user_id", api.user_id().to_owned())],
        &payload,
    )
    .await
}

/// Update a repository's URL and, optionally, rotate its credential.
///
/// Omitting the token keeps the credential stored server-side — this is also
/// the retry path: re-submitting the current URL makes the backend restart
/// onboarding with what it already holds.
pub async fn update(
    api: &ApiClient,
    id: u64,
    url: &str,
    token: Option<&str>,
) -> Result<Repository, Error> {
    let payload = match token {
        Some(token) => json!({ "url": url, "token": token }),
        None => json!({ "url": url }),
    };
    api.put_json(&format!("/repos/{id}"), &[], &payload).await
}

pub async fn delete(api: &ApiClient, id: u64) -> Result<(), Error> {
    api.delete_ok(&format!("/repos/{id}"), &[]).await
}
