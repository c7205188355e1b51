use indexmap::IndexMap;

use crate::filter::{self, ListQuery, SortKey};
use crate::types::{CommitEvent, PredictionRecord, Repository, Webhook, WorkflowRun};

// ---------------------------------------------------------------------------
// Resource store
// ---------------------------------------------------------------------------

/// In-memory collection of tracked entities, keyed by identity.
///
/// Single source of truth for everything a consumer renders. All writes go
/// through `upsert`/`remove` — no component mutates entity fields in place,
/// so a synchronous read always observes a consistent snapshot. Collections
/// are insertion-ordered; `list_*` filters and sorts a borrowed view without
/// disturbing stored order.
#[derive(Debug, Default)]
pub struct ResourceStore {
    repos: IndexMap<u64, Repository>,
    /// Keyed by owning repository id (one-to-one).
    webhooks: IndexMap<u64, Webhook>,
    runs: IndexMap<u64, WorkflowRun>,
    /// Keyed by run id.
    predictions: IndexMap<u64, PredictionRecord>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- repositories ---

    pub fn repository(&self, id: u64) -> Option<&Repository> {
        self.repos.get(&id)
    }

    /// Insert or replace by identity. Idempotent: applying the same entity
    /// twice is indistinguishable from applying it once.
    pub fn upsert_repository(&mut self, repo: Repository) {
        self.repos.insert(repo.id, repo);
    }

    pub fn remove_repository(&mut self, id: u64) -> Option<Repository> {
        // shift_remove keeps the remaining insertion order intact.
        self.repos.shift_remove(&id)
    }

    pub fn repository_ids(&self) -> Vec<u64> {
        self.repos.keys().copied().collect()
    }

    pub fn list_repositories(&self, query: &ListQuery) -> Vec<Repository> {
        let mut out: Vec<Repository> = self
            .repos
            .values()
            .filter(|r| filter::repo_matches(r, query))
            .cloned()
            .collect();
        match query.sort {
            SortKey::Insertion => {}
            SortKey::Name => out.sort_by(|a, b| a.name.cmp(&b.name)),
            SortKey::Updated => out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        }
        out
    }

    // --- webhooks ---

    pub fn webhook(&self, repo_id: u64) -> Option<&Webhook> {
        self.webhooks.get(&repo_id)
    }

    pub fn upsert_webhook(&mut self, webhook: Webhook) {
        self.webhooks.insert(webhook.repo_id, webhook);
    }

    pub fn remove_webhook(&mut self, repo_id: u64) -> Option<Webhook> {
        self.webhooks.shift_remove(&repo_id)
    }

    pub fn webhook_ids(&self) -> Vec<u64> {
        self.webhooks.keys().copied().collect()
    }

    pub fn list_webhooks(&self, query: &ListQuery) -> Vec<Webhook> {
        self.webhooks
            .values()
            .filter(|w| filter::webhook_matches(w, query))
            .cloned()
            .collect()
    }

    // --- workflow runs ---

    pub fn run(&self, id: u64) -> Option<&WorkflowRun> {
        self.runs.get(&id)
    }

    pub fn upsert_run(&mut self, run: WorkflowRun) {
        self.runs.insert(run.id, run);
    }

    pub fn remove_run(&mut self, id: u64) -> Option<WorkflowRun> {
        self.runs.shift_remove(&id)
    }

    pub fn list_runs(&self, query: &ListQuery) -> Vec<WorkflowRun> {
        let mut out: Vec<WorkflowRun> = self
            .runs
            .values()
            .filter(|r| filter::run_matches(r, query))
            .cloned()
            .collect();
        match query.sort {
            SortKey::Insertion => {}
            SortKey::Name => out.sort_by(|a, b| a.name.cmp(&b.name)),
            SortKey::Updated => out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        }
        out
    }

    // --- predictions ---

    pub fn prediction(&self, run_id: u64) -> Option<&PredictionRecord> {
        self.predictions.get(&run_id)
    }

    pub fn upsert_prediction(&mut self, record: PredictionRecord) {
        self.predictions.insert(record.run_id, record);
    }

    pub fn remove_prediction(&mut self, run_id: u64) -> Option<PredictionRecord> {
        self.predictions.shift_remove(&run_id)
    }

    /// Derived read: run ids whose prediction disagrees with the observed
    /// outcome. Recomputed on every call, never cached.
    pub fn mismatched_run_ids(&self) -> Vec<u64> {
        self.runs
            .values()
            .filter(|run| {
                self.predictions
                    .get(&run.id)
                    .is_some_and(|record| record.mismatch(run))
            })
            .map(|run| run.id)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Feed ordering helper
// ---------------------------------------------------------------------------

/// Append a page of feed items, skipping ids already present.
///
/// The feed is append-only: a duplicate page fetched during a race must not
/// reorder or duplicate entries.
pub fn append_unique(items: &mut Vec<CommitEvent>, page: Vec<CommitEvent>) -> usize {
    let mut appended = 0;
    for item in page {
        if items.iter().all(|existing| existing.id != item.id) {
            items.push(item);
            appended += 1;
        }
    }
    appended
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
