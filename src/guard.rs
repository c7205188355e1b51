use crate::error::Error;
use crate::mutation::Operation;
use crate::store::ResourceStore;
use crate::types::{RepoStatus, Repository, Webhook, WebhookStatus};

// ---------------------------------------------------------------------------
// Per-entity predicates
// ---------------------------------------------------------------------------

/// A repository being onboarded must settle before it can be touched.
pub fn can_edit_repository(repo: &Repository) -> bool {
    repo.status != RepoStatus::Pending
}

pub fn can_delete_repository(repo: &Repository) -> bool {
    repo.status != RepoStatus::Pending
}

/// Retry re-submits onboarding; only meaningful once it has failed.
pub fn can_retry_repository(repo: &Repository) -> bool {
    repo.status == RepoStatus::Failed
}

pub fn can_edit_webhook(webhook: &Webhook) -> bool {
    webhook.status != WebhookStatus::Pending
}

pub fn can_delete_webhook(webhook: &Webhook) -> bool {
    webhook.status != WebhookStatus::Pending
}

// ---------------------------------------------------------------------------
// Action-level check
// ---------------------------------------------------------------------------

/// Check that the entity's current state permits the operation.
///
/// Violations surface as `Error::Precondition` (or `Error::NotFound` when the
/// target is not tracked at all), never as silent no-ops, so the confirmation
/// gate is only ever reached for permitted actions. Workflow reruns and
/// report moderation are always permitted client-side — the server decides
/// feasibility.
pub fn check_operation(store: &ResourceStore, op: &Operation) -> Result<(), Error> {
    match op {
        Operation::CreateRepository { .. } => Ok(()),
        Operation::UpdateRepository { id, .. } => {
            let repo = require_repository(store, *id)?;
            if can_edit_repository(repo) {
                Ok(())
            } else {
                Err(Error::Precondition(
                    "repository is still being onboarded".to_owned(),
                ))
            }
        }
        Operation::RetryRepository { id } => {
            let repo = require_repository(store, *id)?;
            if can_retry_repository(repo) {
                Ok(())
            } else {
                Err(Error::Precondition(
                    "retry is only available for failed repositories".to_owned(),
                ))
            }
        }
        Operation::DeleteRepository { id } => {
            let repo = require_repository(store, *id)?;
            if can_delete_repository(repo) {
                Ok(())
            } else {
                Err(Error::Precondition(
                    "repository is still being onboarded".to_owned(),
                ))
            }
        }
        Operation::ConfigureWebhook { repo_id, .. } => {
            require_repository(store, *repo_id)?;
            match store.webhook(*repo_id) {
                Some(webhook) if webhook.status == WebhookStatus::Pending => Err(
                    Error::Precondition("webhook configuration is in progress".to_owned()),
                ),
                _ => Ok(()),
            }
        }
        Operation::UpdateWebhook { repo_id, .. } => {
            let webhook = require_webhook(store, *repo_id)?;
            if can_edit_webhook(webhook) {
                Ok(())
            } else {
                Err(Error::Precondition(
                    "webhook configuration is in progress".to_owned(),
                ))
            }
        }
        Operation::DeleteWebhook { repo_id } => {
            let webhook = require_webhook(store, *repo_id)?;
            if can_delete_webhook(webhook) {
                Ok(())
            } else {
                Err(Error::Precondition(
                    "webhook configuration is in progress".to_owned(),
                ))
            }
        }
        Operation::TriggerSync { repo_id } => {
            require_repository(store, *repo_id)?;
            Ok(())
        }
        Operation::RerunWorkflow { .. }
        | Operation::ModerateReport { .. }
        | Operation::DeleteReport { .. } => Ok(()),
    }
}

fn require_repository(store: &ResourceStore, id: u64) -> Result<&Repository, Error> {
    store
        .repository(id)
        .ok_or_else(|| Error::NotFound(format!("repository {id}")))
}

fn require_webhook(store: &ResourceStore, repo_id: u64) -> Result<&Webhook, Error> {
    store
        .webhook(repo_id)
        .ok_or_else(|| Error::NotFound(format!("webhook for repository {repo_id}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
