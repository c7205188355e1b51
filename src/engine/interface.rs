use std::sync::mpsc::Sender;

use crate::backend::runs::RunQuery;
use crate::mutation::Operation;
use crate::types::{CommitEvent, PredictionRecord, Repository, Webhook, WorkflowRun};

/// Handle to the backend engine held by the UI layer.
///
/// Cheaply cloneable. When the last handle is dropped the sender channel
/// closes, signalling the engine to shut down.
#[derive(Clone)]
pub struct EngineHandle {
    tx: tokio::sync::mpsc::UnboundedSender<Request>,
}

impl EngineHandle {
    pub(super) fn new(tx: tokio::sync::mpsc::UnboundedSender<Request>) -> Self {
        Self { tx }
    }

    /// Send a request to the engine. Non-blocking — returns immediately.
    pub fn send(&self, req: Request) {
        // Ignore errors: if the receiver is gone the engine has already shut down.
        let _ = self.tx.send(req);
    }
}

/// Trait implemented by both `BackendEngine` and `StubEngine`.
pub trait Engine: Send + 'static {
    fn start(self) -> EngineHandle;
}

/// Collections the poll-refresh controller reconciles.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RefreshScope {
    Repositories,
    Webhooks,
    Runs,
}

/// All operations the UI layer can send to the engine.
pub enum Request {
    // -----------------------------------------------------------------------
    // Fetch operations (UI pulls data on demand; each fetch reconciles the
    // store before replying)
    // -----------------------------------------------------------------------
    FetchRepositories {
        /// Client-side list query (free text, `status:`, `sort:`).
        query: String,
        reply_tx: Sender<Event>,
    },
    FetchWebhooks {
        query: String,
        reply_tx: Sender<Event>,
    },
    /// Re-check a single repository's webhook, e.g. right after configuring
    /// it, without waiting for the next full poll.
    CheckWebhook {
        repo_id: u64,
        reply_tx: Sender<Event>,
    },
    FetchRuns {
        /// Server-side collection query (workflow, branch, page).
        query: RunQuery,
        reply_tx: Sender<Event>,
    },
    FetchRunDetail {
        run_id: u64,
        reply_tx: Sender<Event>,
    },
    /// Fetch predictions for the given runs; an empty list means "latest
    /// across all repositories".
    FetchPredictions {
        run_ids: Vec<u64>,
        reply_tx: Sender<Event>,
    },

    // -----------------------------------------------------------------------
    // Commit feed
    // -----------------------------------------------------------------------
    LoadMoreCommits {
        reply_tx: Sender<Event>,
    },
    ResetFeed,

    // -----------------------------------------------------------------------
    // Poll-refresh (user-triggered or background registration)
    // -----------------------------------------------------------------------
    Refresh {
        scope: RefreshScope,
        reply_tx: Sender<Event>,
    },
    RegisterRefresh {
        scopes: Vec<RefreshScope>,
        notify_tx: Sender<Event>,
    },

    // -----------------------------------------------------------------------
    // Mutations — guard, gate, then coordinator
    // -----------------------------------------------------------------------
    Mutate {
        op: Operation,
        reply_tx: Sender<Event>,
    },

    // -----------------------------------------------------------------------
    // Control
    // -----------------------------------------------------------------------
    Shutdown,
}

/// A prediction joined with its derived mismatch flag, recomputed on every
/// fetch against the currently tracked run.
#[derive(Debug, Clone)]
pub struct RunPrediction {
    pub record: PredictionRecord,
    pub mismatch: bool,
}

/// All events the engine can push back to UI views.
pub enum Event {
    // -----------------------------------------------------------------------
    // Fetch results
    // -----------------------------------------------------------------------
    RepositoriesFetched {
        repos: Vec<Repository>,
    },
    WebhooksFetched {
        webhooks: Vec<Webhook>,
    },
    WebhookChecked {
        repo_id: u64,
        /// `None` when no webhook exists server-side for the repository.
        webhook: Option<Webhook>,
    },
    RunsFetched {
        runs: Vec<WorkflowRun>,
    },
    RunDetailFetched {
        run_id: u64,
        /// `None` when the run no longer exists server-side.
        run: Option<WorkflowRun>,
    },
    PredictionsFetched {
        predictions: Vec<RunPrediction>,
    },
    CommitsPage {
        /// Full accumulated feed, in insertion order.
        items: Vec<CommitEvent>,
        /// Items this page added (0 for a deduplicated duplicate page).
        appended: usize,
        has_more: bool,
    },
    /// One-time notice for a backend-detected transition into a failed state.
    StatusAlert {
        message: String,
    },
    /// Unified error event for fetch failures.
    FetchError {
        context: String,
        message: String,
    },

    // -----------------------------------------------------------------------
    // Mutation results
    // -----------------------------------------------------------------------
    MutationOk {
        description: String,
    },
    /// The user declined the confirmation gate; nothing was dispatched.
    MutationDeclined {
        description: String,
    },
    MutationError {
        description: String,
        message: String,
    },
}
