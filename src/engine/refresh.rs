use std::collections::HashSet;
use std::sync::mpsc::Sender;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, TimeDelta, Utc};

use crate::store::ResourceStore;
use crate::types::{RepoStatus, Repository, Webhook, WebhookStatus, WorkflowRun};

use super::interface::{Event, RefreshScope};

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

struct RefreshEntry {
    scope: RefreshScope,
    interval: Duration,
    notify_tx: Sender<Event>,
    // SystemTime (wall clock) intentionally — Instant uses CLOCK_MONOTONIC,
    // which freezes during laptop sleep, causing missed refreshes after wake.
    last_fetch: Option<SystemTime>,
}

/// Tracks per-scope background refresh state for the engine.
pub struct RefreshScheduler {
    entries: Vec<RefreshEntry>,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register scopes for background refresh, replacing any existing
    /// entries for the same scopes.
    pub fn register(
        &mut self,
        scopes: Vec<RefreshScope>,
        interval: Duration,
        notify_tx: &Sender<Event>,
    ) {
        self.entries.retain(|e| !scopes.contains(&e.scope));
        for scope in scopes {
            self.entries.push(RefreshEntry {
                scope,
                interval,
                notify_tx: notify_tx.clone(),
                last_fetch: None,
            });
        }
    }

    /// Mark the given scope as having just been fetched.
    pub fn mark_fetched(&mut self, scope: RefreshScope) {
        let now = SystemTime::now();
        for entry in &mut self.entries {
            if entry.scope == scope {
                entry.last_fetch = Some(now);
            }
        }
    }

    /// Return all entries whose refresh interval has elapsed since last
    /// fetch.
    ///
    /// Entries that have never been fetched fire immediately on the first
    /// tick after registration.
    pub fn due_entries(&self) -> Vec<DueEntry> {
        let now = SystemTime::now();
        self.entries
            .iter()
            .filter(|e| {
                e.last_fetch.is_none_or(|t| {
                    now.duration_since(t).unwrap_or(Duration::ZERO) >= e.interval
                })
            })
            .map(|e| DueEntry {
                scope: e.scope,
                notify_tx: e.notify_tx.clone(),
            })
            .collect()
    }
}

/// An entry that is due for background refresh.
pub struct DueEntry {
    pub scope: RefreshScope,
    pub notify_tx: Sender<Event>,
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Reconcile the repository collection with a fresh snapshot.
///
/// Entries are replaced by identity; repositories that vanished server-side
/// are dropped along with their webhooks. Returns one alert per transition
/// into `Failed` — only for repositories that were already tracked, so the
/// very first snapshot never floods the consumer with historical failures.
pub(crate) fn reconcile_repositories(
    store: &mut ResourceStore,
    fetched: Vec<Repository>,
) -> Vec<String> {
    let mut alerts = Vec::new();
    let fetched_ids: HashSet<u64> = fetched.iter().map(|r| r.id).collect();

    for repo in fetched {
        let before = store.repository(repo.id).map(|r| r.status);
        if repo.status == RepoStatus::Failed
            && before.is_some()
            && before != Some(RepoStatus::Failed)
        {
            alerts.push(format!("repository {} failed onboarding", repo.name));
        }
        store.upsert_repository(repo);
    }

    for id in store.repository_ids() {
        if !fetched_ids.contains(&id) {
            store.remove_repository(id);
            store.remove_webhook(id);
        }
    }

    alerts
}

/// Reconcile webhook configurations, applying the pending-expiry policy:
/// a webhook still `Pending` past `pending_expiry` (measured against its
/// server-side `updated_at`) is recorded as `Failed` locally. The next poll
/// observing real server state wins either way.
pub(crate) fn reconcile_webhooks(
    store: &mut ResourceStore,
    fetched: Vec<Webhook>,
    pending_expiry: TimeDelta,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut alerts = Vec::new();
    let fetched_ids: HashSet<u64> = fetched.iter().map(|w| w.repo_id).collect();

    for mut webhook in fetched {
        if webhook.status == WebhookStatus::Pending
            && now.signed_duration_since(webhook.updated_at) > pending_expiry
        {
            webhook.status = WebhookStatus::Failed;
        }

        let before = store.webhook(webhook.repo_id).map(|w| w.status);
        if webhook.status == WebhookStatus::Failed
            && before.is_some()
            && before != Some(WebhookStatus::Failed)
        {
            alerts.push(format!(
                "webhook for repository #{} failed to configure",
                webhook.repo_id
            ));
        }
        store.upsert_webhook(webhook);
    }

    for repo_id in store.webhook_ids() {
        if !fetched_ids.contains(&repo_id) {
            store.remove_webhook(repo_id);
        }
    }

    alerts
}

/// Reconcile a page of workflow runs. The collection is a paginated window,
/// so absent runs are not removed; a run's disappearance is only ever
/// discovered through a direct detail fetch.
pub(crate) fn reconcile_runs(store: &mut ResourceStore, fetched: Vec<WorkflowRun>) {
    for run in fetched {
        store.upsert_run(run);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
