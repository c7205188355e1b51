use tokio::sync::mpsc::UnboundedReceiver;

use crate::feed::FeedController;
use crate::filter;
use crate::types::{CommitEvent, PredictionRecord, Repository, Webhook, WorkflowRun};

use super::interface::{Engine, EngineHandle, Event, RefreshScope, Request, RunPrediction};

/// A stub engine that serves pre-loaded fixture data without any network
/// calls.
///
/// Useful for integration tests and demos that must not require a running
/// backend. Mutations succeed instantly; refresh registration is ignored.
pub struct StubEngine {
    pub repos: Vec<Repository>,
    pub webhooks: Vec<Webhook>,
    pub runs: Vec<WorkflowRun>,
    pub commits: Vec<CommitEvent>,
    pub predictions: Vec<PredictionRecord>,
    pub feed_page_size: u32,
}

impl Default for StubEngine {
    fn default() -> Self {
        Self {
            repos: Vec::new(),
            webhooks: Vec::new(),
            runs: Vec::new(),
            commits: Vec::new(),
            predictions: Vec::new(),
            feed_page_size: 5,
        }
    }
}

impl Engine for StubEngine {
    fn start(self) -> EngineHandle {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Request>();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("stub tokio runtime");
            rt.block_on(self.run_loop(rx));
        });
        EngineHandle::new(tx)
    }
}

impl StubEngine {
    async fn run_loop(self, mut rx: UnboundedReceiver<Request>) {
        let mut feed = FeedController::new(self.feed_page_size.max(1));

        while let Some(req) = rx.recv().await {
            match req {
                Request::FetchRepositories { query, reply_tx } => {
                    let query = filter::parse_query(&query);
                    let repos = self
                        .repos
                        .iter()
                        .filter(|r| filter::repo_matches(r, &query))
                        .cloned()
                        .collect();
                    let _ = reply_tx.send(Event::RepositoriesFetched { repos });
                }

                Request::FetchWebhooks { query, reply_tx } => {
                    let query = filter::parse_query(&query);
                    let webhooks = self
                        .webhooks
                        .iter()
                        .filter(|w| filter::webhook_matches(w, &query))
                        .cloned()
                        .collect();
                    let _ = reply_tx.send(Event::WebhooksFetched { webhooks });
                }

                Request::CheckWebhook { repo_id, reply_tx } => {
                    let webhook = self
                        .webhooks
                        .iter()
                        .find(|w| w.repo_id == repo_id)
                        .cloned();
                    let _ = reply_tx.send(Event::WebhookChecked { repo_id, webhook });
                }

                Request::FetchRuns { reply_tx, .. } => {
                    let _ = reply_tx.send(Event::RunsFetched {
                        runs: self.runs.clone(),
                    });
                }

                Request::FetchRunDetail { run_id, reply_tx } => {
                    let run = self.runs.iter().find(|r| r.id == run_id).cloned();
                    let _ = reply_tx.send(Event::RunDetailFetched { run_id, run });
                }

                Request::FetchPredictions { run_ids, reply_tx } => {
                    let predictions = self
                        .predictions
                        .iter()
                        .filter(|p| run_ids.is_empty() || run_ids.contains(&p.run_id))
                        .map(|record| {
                            let mismatch = self
                                .runs
                                .iter()
                                .find(|r| r.id == record.run_id)
                                .is_some_and(|run| record.mismatch(run));
                            RunPrediction {
                                record: record.clone(),
                                mismatch,
                            }
                        })
                        .collect();
                    let _ = reply_tx.send(Event::PredictionsFetched { predictions });
                }

                Request::LoadMoreCommits { reply_tx } => {
                    if let Some(cursor) = feed.begin() {
                        let start = ((cursor.page() - 1) * cursor.limit()) as usize;
                        let end = (start + cursor.limit() as usize).min(self.commits.len());
                        let page = if start < self.commits.len() {
                            self.commits[start..end].to_vec()
                        } else {
                            Vec::new()
                        };
                        let appended = feed.complete(page);
                        let _ = reply_tx.send(Event::CommitsPage {
                            items: feed.items().to_vec(),
                            appended,
                            has_more: feed.has_more(),
                        });
                    } else {
                        // Exhausted — permanent no-op returning the same
                        // sequence.
                        let _ = reply_tx.send(Event::CommitsPage {
                            items: feed.items().to_vec(),
                            appended: 0,
                            has_more: feed.has_more(),
                        });
                    }
                }

                Request::ResetFeed => feed.reset(),

                Request::Refresh { scope, reply_tx } => {
                    let event = match scope {
                        RefreshScope::Repositories => Event::RepositoriesFetched {
                            repos: self.repos.clone(),
                        },
                        RefreshScope::Webhooks => Event::WebhooksFetched {
                            webhooks: self.webhooks.clone(),
                        },
                        RefreshScope::Runs => Event::RunsFetched {
                            runs: self.runs.clone(),
                        },
                    };
                    let _ = reply_tx.send(event);
                }

                // Refresh registration — ignored by stub
                Request::RegisterRefresh { .. } => {}

                // All mutations succeed instantly
                Request::Mutate { op, reply_tx } => {
                    let _ = reply_tx.send(Event::MutationOk {
                        description: op.describe(),
                    });
                }

                Request::Shutdown => break,
            }
        }
    }
}
