use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::backend::{self, ApiClient, runs::RunQuery};
use crate::config::types::AppConfig;
use crate::error::Error;
use crate::feed::FeedController;
use crate::filter;
use crate::gate::ConfirmationGate;
use crate::guard;
use crate::mutation::{MutationCoordinator, Operation};
use crate::session::Session;
use crate::store::ResourceStore;

use super::interface::{Engine, EngineHandle, Event, RefreshScope, Request, RunPrediction};
use super::refresh::{
    RefreshScheduler, reconcile_repositories, reconcile_runs, reconcile_webhooks,
};

/// The real backend engine.
pub struct BackendEngine {
    config: AppConfig,
    session: Session,
    gate: Arc<dyn ConfirmationGate>,
}

impl BackendEngine {
    pub fn new(config: AppConfig, session: Session, gate: Arc<dyn ConfirmationGate>) -> Self {
        Self {
            config,
            session,
            gate,
        }
    }
}

impl Engine for BackendEngine {
    fn start(self) -> EngineHandle {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Request>();
        let handle = EngineHandle::new(tx);
        let _ = std::thread::Builder::new()
            .name("pipewatch-engine".to_owned())
            .spawn(move || {
                let rt = tokio::runtime::Runtime::new().expect("tokio runtime init");
                rt.block_on(self.run_loop(rx));
            });
        handle
    }
}

/// State shared between the engine loop and spawned request tasks.
struct Shared {
    api: Arc<ApiClient>,
    store: Mutex<ResourceStore>,
    coordinator: MutationCoordinator,
    feed: Mutex<FeedController>,
    gate: Arc<dyn ConfirmationGate>,
    scheduler: Mutex<RefreshScheduler>,
    refresh_interval: Duration,
    pending_expiry: TimeDelta,
}

impl BackendEngine {
    async fn run_loop(self, mut rx: UnboundedReceiver<Request>) {
        let api = Arc::new(ApiClient::new(
            self.config.backend.base_url.clone(),
            self.session,
            self.config.defaults.refetch_interval_minutes,
        ));
        let interval_mins = u64::from(self.config.defaults.refetch_interval_minutes);
        let shared = Arc::new(Shared {
            api: Arc::clone(&api),
            store: Mutex::new(ResourceStore::new()),
            coordinator: MutationCoordinator::new(api),
            feed: Mutex::new(FeedController::new(self.config.defaults.feed_page_size)),
            gate: self.gate,
            scheduler: Mutex::new(RefreshScheduler::new()),
            refresh_interval: Duration::from_secs((interval_mins * 60).max(60)),
            pending_expiry: TimeDelta::minutes(i64::from(
                self.config.defaults.webhook_pending_expiry_minutes,
            )),
        });

        // The tick is the scheduler's heartbeat; each entry still honors its
        // own interval via `due_entries`.
        let mut refresh_tick = tokio::time::interval(Duration::from_secs(60));
        // Consume the first immediate tick so refresh fires after one full interval.
        refresh_tick.tick().await;

        loop {
            tokio::select! {
                biased;
                maybe_req = rx.recv() => {
                    match maybe_req {
                        None | Some(Request::Shutdown) => {
                            tracing::debug!("engine: shutting down");
                            break;
                        }
                        Some(req) => handle_request(req, &shared),
                    }
                }
                _ = refresh_tick.tick() => {
                    tick_refresh(&shared);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Request dispatch
// ---------------------------------------------------------------------------

/// Dispatch a request. Network-bound work is spawned so a slow backend call
/// never blocks other interaction; only synchronous state claims (the feed's
/// `begin`, scheduler registration) happen inline.
fn handle_request(req: Request, shared: &Arc<Shared>) {
    tracing::debug!("engine: received request");
    match req {
        Request::FetchRepositories { query, reply_tx } => {
            let shared = Arc::clone(shared);
            tokio::spawn(async move {
                refresh_repositories(&shared, &reply_tx, &query).await;
            });
        }

        Request::FetchWebhooks { query, reply_tx } => {
            let shared = Arc::clone(shared);
            tokio::spawn(async move {
                refresh_webhooks(&shared, &reply_tx, &query).await;
            });
        }

        Request::CheckWebhook { repo_id, reply_tx } => {
            let shared = Arc::clone(shared);
            tokio::spawn(async move {
                check_webhook(&shared, repo_id, &reply_tx).await;
            });
        }

        Request::FetchRuns { query, reply_tx } => {
            let shared = Arc::clone(shared);
            tokio::spawn(async move {
                fetch_runs(&shared, query, &reply_tx).await;
            });
        }

        Request::FetchRunDetail { run_id, reply_tx } => {
            let shared = Arc::clone(shared);
            tokio::spawn(async move {
                fetch_run_detail(&shared, run_id, &reply_tx).await;
            });
        }

        Request::FetchPredictions { run_ids, reply_tx } => {
            let shared = Arc::clone(shared);
            tokio::spawn(async move {
                fetch_predictions(&shared, run_ids, &reply_tx).await;
            });
        }

        Request::LoadMoreCommits { reply_tx } => {
            // Claim the load before any await so a racing second request
            // observes `Loading` and no-ops.
            let cursor = shared.feed.lock().expect("feed lock").begin();
            match cursor {
                Some(cursor) => {
                    let shared = Arc::clone(shared);
                    tokio::spawn(async move {
                        match backend::commits::page(&shared.api, cursor.page(), cursor.limit())
                            .await
                        {
                            Ok(page) => {
                                let mut feed = shared.feed.lock().expect("feed lock");
                                let appended = feed.complete(page);
                                let _ = reply_tx.send(Event::CommitsPage {
                                    items: feed.items().to_vec(),
                                    appended,
                                    has_more: feed.has_more(),
                                });
                            }
                            Err(e) => {
                                shared.feed.lock().expect("feed lock").abort();
                                let _ = reply_tx.send(Event::FetchError {
                                    context: "LoadMoreCommits".to_owned(),
                                    message: e.user_message(),
                                });
                            }
                        }
                    });
                }
                None => {
                    let feed = shared.feed.lock().expect("feed lock");
                    if feed.has_more() {
                        // A load is already in flight — deliberately ignored,
                        // not queued.
                        tracing::debug!("engine: LoadMoreCommits ignored, load in flight");
                    } else {
                        let _ = reply_tx.send(Event::CommitsPage {
                            items: feed.items().to_vec(),
                            appended: 0,
                            has_more: false,
                        });
                    }
                }
            }
        }

        Request::ResetFeed => {
            shared.feed.lock().expect("feed lock").reset();
        }

        Request::Refresh { scope, reply_tx } => {
            let shared = Arc::clone(shared);
            tokio::spawn(async move {
                refresh_scope(&shared, scope, &reply_tx).await;
            });
        }

        Request::RegisterRefresh { scopes, notify_tx } => {
            let interval = shared.refresh_interval;
            shared
                .scheduler
                .lock()
                .expect("scheduler lock")
                .register(scopes, interval, &notify_tx);
        }

        Request::Mutate { op, reply_tx } => {
            let shared = Arc::clone(shared);
            tokio::spawn(async move {
                let event = execute_mutation(
                    &shared.coordinator,
                    &shared.store,
                    shared.gate.as_ref(),
                    op,
                )
                .await;
                let _ = reply_tx.send(event);
            });
        }

        // Handled in the run loop.
        Request::Shutdown => {}
    }
}

fn tick_refresh(shared: &Arc<Shared>) {
    let due = shared
        .scheduler
        .lock()
        .expect("scheduler lock")
        .due_entries();
    for entry in due {
        let shared = Arc::clone(shared);
        tokio::spawn(async move {
            refresh_scope(&shared, entry.scope, &entry.notify_tx).await;
        });
    }
}

// ---------------------------------------------------------------------------
// Mutation flow
// ---------------------------------------------------------------------------

/// Run one user action through guard → gate → coordinator.
///
/// Guard violations surface before the gate is consulted; a declined gate
/// never reaches the coordinator, leaving the store and the per-entity
/// mutation slot untouched.
pub async fn execute_mutation(
    coordinator: &MutationCoordinator,
    store: &Mutex<ResourceStore>,
    gate: &dyn ConfirmationGate,
    op: Operation,
) -> Event {
    let description = op.describe();

    {
        let store = store.lock().expect("store lock");
        if let Err(e) = guard::check_operation(&store, &op) {
            tracing::debug!("engine: {description} rejected: {e}");
            return Event::MutationError {
                description,
                message: e.user_message(),
            };
        }
    }

    if op.is_destructive() && !gate.request_confirmation(&description) {
        tracing::debug!("engine: {description} declined at confirmation gate");
        return Event::MutationDeclined { description };
    }

    match coordinator.submit(store, op).await {
        Ok(_) => {
            tracing::debug!("engine: sending MutationOk \"{description}\"");
            Event::MutationOk { description }
        }
        Err(e) => {
            tracing::debug!("engine: \"{description}\" error: {e}");
            Event::MutationError {
                description,
                message: e.user_message(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch + reconcile flows
// ---------------------------------------------------------------------------

async fn refresh_scope(shared: &Arc<Shared>, scope: RefreshScope, reply_tx: &Sender<Event>) {
    match scope {
        RefreshScope::Repositories => refresh_repositories(shared, reply_tx, "").await,
        RefreshScope::Webhooks => refresh_webhooks(shared, reply_tx, "").await,
        RefreshScope::Runs => fetch_runs(shared, RunQuery::default(), reply_tx).await,
    }
}

async fn refresh_repositories(shared: &Arc<Shared>, reply_tx: &Sender<Event>, query: &str) {
    match backend::repos::list(&shared.api).await {
        Ok(fetched) => {
            let (alerts, repos) = {
                let mut store = shared.store.lock().expect("store lock");
                let alerts = reconcile_repositories(&mut store, fetched);
                (alerts, store.list_repositories(&filter::parse_query(query)))
            };
            shared
                .scheduler
                .lock()
                .expect("scheduler lock")
                .mark_fetched(RefreshScope::Repositories);
            for message in alerts {
                let _ = reply_tx.send(Event::StatusAlert { message });
            }
            tracing::debug!("engine: sending RepositoriesFetched count={}", repos.len());
            let _ = reply_tx.send(Event::RepositoriesFetched { repos });
        }
        Err(e) => {
            tracing::debug!("engine: FetchRepositories error: {e}");
            let _ = reply_tx.send(Event::FetchError {
                context: "FetchRepositories".to_owned(),
                message: e.user_message(),
            });
        }
    }
}

async fn refresh_webhooks(shared: &Arc<Shared>, reply_tx: &Sender<Event>, query: &str) {
    match backend::webhooks::list(&shared.api).await {
        Ok(fetched) => {
            let (alerts, webhooks) = {
                let mut store = shared.store.lock().expect("store lock");
                let alerts =
                    reconcile_webhooks(&mut store, fetched, shared.pending_expiry, Utc::now());
                (alerts, store.list_webhooks(&filter::parse_query(query)))
            };
            shared
                .scheduler
                .lock()
                .expect("scheduler lock")
                .mark_fetched(RefreshScope::Webhooks);
            for message in alerts {
                let _ = reply_tx.send(Event::StatusAlert { message });
            }
            tracing::debug!("engine: sending WebhooksFetched count={}", webhooks.len());
            let _ = reply_tx.send(Event::WebhooksFetched { webhooks });
        }
        Err(e) => {
            tracing::debug!("engine: FetchWebhooks error: {e}");
            let _ = reply_tx.send(Event::FetchError {
                context: "FetchWebhooks".to_owned(),
                message: e.user_message(),
            });
        }
    }
}

async fn check_webhook(shared: &Arc<Shared>, repo_id: u64, reply_tx: &Sender<Event>) {
    match backend::webhooks::check(&shared.api, repo_id).await {
        Ok(webhook) => {
            shared
                .store
                .lock()
                .expect("store lock")
                .upsert_webhook(webhook.clone());
            let _ = reply_tx.send(Event::WebhookChecked {
                repo_id,
                webhook: Some(webhook),
            });
        }
        Err(Error::NotFound(_)) => {
            shared
                .store
                .lock()
                .expect("store lock")
                .remove_webhook(repo_id);
            let _ = reply_tx.send(Event::WebhookChecked {
                repo_id,
                webhook: None,
            });
        }
        Err(e) => {
            tracing::debug!("engine: CheckWebhook #{repo_id} error: {e}");
            let _ = reply_tx.send(Event::FetchError {
                context: format!("CheckWebhook #{repo_id}"),
                message: e.user_message(),
            });
        }
    }
}

async fn fetch_runs(shared: &Arc<Shared>, query: RunQuery, reply_tx: &Sender<Event>) {
    match backend::runs::list(&shared.api, &query).await {
        Ok(runs) => {
            {
                let mut store = shared.store.lock().expect("store lock");
                reconcile_runs(&mut store, runs.clone());
            }
            shared
                .scheduler
                .lock()
                .expect("scheduler lock")
                .mark_fetched(RefreshScope::Runs);
            tracing::debug!("engine: sending RunsFetched count={}", runs.len());
            let _ = reply_tx.send(Event::RunsFetched { runs });
        }
        Err(e) => {
            tracing::debug!("engine: FetchRuns error: {e}");
            let _ = reply_tx.send(Event::FetchError {
                context: "FetchRuns".to_owned(),
                message: e.user_message(),
            });
        }
    }
}

async fn fetch_run_detail(shared: &Arc<Shared>, run_id: u64, reply_tx: &Sender<Event>) {
    match backend::runs::get(&shared.api, run_id).await {
        Ok(run) => {
            shared
                .store
                .lock()
                .expect("store lock")
                .upsert_run(run.clone());
            let _ = reply_tx.send(Event::RunDetailFetched {
                run_id,
                run: Some(run),
            });
        }
        Err(Error::NotFound(_)) => {
            // Discovered gone on refresh — drop it from the store.
            shared.store.lock().expect("store lock").remove_run(run_id);
            let _ = reply_tx.send(Event::RunDetailFetched { run_id, run: None });
        }
        Err(e) => {
            tracing::debug!("engine: FetchRunDetail #{run_id} error: {e}");
            let _ = reply_tx.send(Event::FetchError {
                context: format!("FetchRunDetail #{run_id}"),
                message: e.user_message(),
            });
        }
    }
}

async fn fetch_predictions(shared: &Arc<Shared>, run_ids: Vec<u64>, reply_tx: &Sender<Event>) {
    let fetched = if run_ids.is_empty() {
        backend::predictions::latest(&shared.api).await
    } else {
        backend::predictions::batch(&shared.api, &run_ids).await
    };
    match fetched {
        Ok(records) => {
            let predictions = {
                let mut store = shared.store.lock().expect("store lock");
                records
                    .into_iter()
                    .map(|record| {
                        store.upsert_prediction(record.clone());
                        let mismatch = store
                            .run(record.run_id)
                            .is_some_and(|run| record.mismatch(run));
                        RunPrediction { record, mismatch }
                    })
                    .collect()
            };
            let _ = reply_tx.send(Event::PredictionsFetched { predictions });
        }
        Err(e) => {
            tracing::debug!("engine: FetchPredictions error: {e}");
            let _ = reply_tx.send(Event::FetchError {
                context: "FetchPredictions".to_owned(),
                message: e.user_message(),
            });
        }
    }
}
