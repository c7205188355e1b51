use crate::backend::ApiClient;
use crate::error::Error;
use crate::types::CommitEvent;

/// Fetch one page of the commit feed. Pages are 1-based; the cursor is
/// opaque to everything above the feed controller.
pub async fn page(api: &ApiClient, page: u32, limit: u32) -> Result<Vec<CommitEvent>, Error> {
    api.get_json(
        "/commits",
        &[
            ("user_id", api.user_id().to_owned()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ],
    )
    .await
}
