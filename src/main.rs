use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

use pipewatch::backend::runs::RunQuery;
use pipewatch::config::loader;
use pipewatch::engine::{BackendEngine, Engine as _, Event, RefreshScope, Request};
use pipewatch::filter::{conclusion_name, repo_status_name, run_status_name, webhook_status_name};
use pipewatch::gate::StdinGate;
use pipewatch::mutation::Operation;
use pipewatch::session::{Session, resolve_token};

#[derive(Parser)]
#[command(name = "pipewatch", version, about = "CI failure-prediction dashboard client")]
struct Cli {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connected repositories.
    Repos {
        /// Filter query, e.g. "status:failed sort:name widgets".
        #[arg(default_value = "")]
        query: String,
    },
    /// List webhook configurations.
    Webhooks {
        #[arg(default_value = "")]
        query: String,
    },
    /// List workflow runs.
    Runs {
        #[arg(long)]
        workflow: Option<u64>,
        #[arg(long)]
        branch: Option<String>,
    },
    /// Page through the commit feed.
    Feed {
        /// Number of pages to load.
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show predictions (and mismatches) for the given runs.
    Predictions {
        run_ids: Vec<u64>,
    },
    /// Connect a new repository.
    Connect {
        url: String,
        token: String,
    },
    /// Rerun a workflow run.
    Rerun {
        run_id: u64,
    },
    /// Poll for status transitions until interrupted.
    Watch,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = loader::load_config(cli.config.as_deref())?;
    let token = resolve_token(config.backend.token.as_deref())?;
    let session = Session::new(config.backend.user_id.clone(), token);

    let engine = BackendEngine::new(config, session, Arc::new(StdinGate));
    let handle = engine.start();
    let (tx, rx) = channel::<Event>();

    match cli.command {
        Commands::Repos { query } => {
            handle.send(Request::FetchRepositories {
                query,
                reply_tx: tx,
            });
            wait_and_print(&rx)?;
        }
        Commands::Webhooks { query } => {
            handle.send(Request::FetchWebhooks {
                query,
                reply_tx: tx,
            });
            wait_and_print(&rx)?;
        }
        Commands::Runs { workflow, branch } => {
            let query = RunQuery {
                workflow_id: workflow,
                branch,
                ..Default::default()
            };
            handle.send(Request::FetchRuns {
                query,
                reply_tx: tx,
            });
            wait_and_print(&rx)?;
        }
        Commands::Feed { pages } => {
            for _ in 0..pages.max(1) {
                handle.send(Request::LoadMoreCommits {
                    reply_tx: tx.clone(),
                });
                if !wait_and_print(&rx)? {
                    break;
                }
            }
        }
        Commands::Predictions { run_ids } => {
            // Runs must be tracked before a mismatch can be derived.
            handle.send(Request::FetchRuns {
                query: RunQuery::default(),
                reply_tx: tx.clone(),
            });
            wait_for_reply(&rx)?;
            handle.send(Request::FetchPredictions {
                run_ids,
                reply_tx: tx,
            });
            wait_and_print(&rx)?;
        }
        Commands::Connect { url, token } => {
            handle.send(Request::Mutate {
                op: Operation::CreateRepository { url, token },
                reply_tx: tx,
            });
            wait_and_print(&rx)?;
        }
        Commands::Rerun { run_id } => {
            handle.send(Request::Mutate {
                op: Operation::RerunWorkflow { run_id },
                reply_tx: tx,
            });
            wait_and_print(&rx)?;
        }
        Commands::Watch => {
            handle.send(Request::RegisterRefresh {
                scopes: vec![
                    RefreshScope::Repositories,
                    RefreshScope::Webhooks,
                    RefreshScope::Runs,
                ],
                notify_tx: tx.clone(),
            });
            for scope in [
                RefreshScope::Repositories,
                RefreshScope::Webhooks,
                RefreshScope::Runs,
            ] {
                handle.send(Request::Refresh {
                    scope,
                    reply_tx: tx.clone(),
                });
            }
            eprintln!("watching for status transitions (Ctrl-C to stop)");
            loop {
                let event = rx.recv().context("engine channel closed")?;
                print_event(&event);
            }
        }
    }

    Ok(())
}

/// Wait for the next engine reply and print it. Returns `false` once a
/// terminal reply (exhausted feed, error) was printed.
fn wait_and_print(rx: &Receiver<Event>) -> Result<bool> {
    loop {
        let event = wait_for_reply(rx)?;
        let more = print_event(&event);
        // Status alerts precede the payload reply; keep waiting for it.
        if !matches!(event, Event::StatusAlert { .. }) {
            return Ok(more);
        }
    }
}

fn wait_for_reply(rx: &Receiver<Event>) -> Result<Event> {
    rx.recv_timeout(Duration::from_secs(60))
        .context("timed out waiting for the engine")
}

/// Print an event; returns `false` when no follow-up request is useful.
fn print_event(event: &Event) -> bool {
    match event {
        Event::RepositoriesFetched { repos } => {
            for repo in repos {
                println!(
                    "#{:<5} {:<10} {}",
                    repo.id,
                    repo_status_name(repo.status),
                    repo.name
                );
            }
        }
        Event::WebhooksFetched { webhooks } => {
            for webhook in webhooks {
                println!(
                    "repo #{:<5} {:<12} {}",
                    webhook.repo_id,
                    webhook_status_name(webhook.status),
                    webhook.delivery_url
                );
            }
        }
        Event::WebhookChecked { repo_id, webhook } => match webhook {
            Some(webhook) => println!(
                "repo #{repo_id}: webhook {}",
                webhook_status_name(webhook.status)
            ),
            None => println!("repo #{repo_id}: no webhook configured"),
        },
        Event::RunsFetched { runs } => {
            for run in runs {
                let conclusion = run.conclusion.map_or("-", conclusion_name);
                println!(
                    "#{:<10} {:<12} {:<16} {} @{}",
                    run.id,
                    run_status_name(run.status),
                    conclusion,
                    run.name,
                    run.head_branch.as_deref().unwrap_or("-")
                );
            }
        }
        Event::RunDetailFetched { run_id, run } => match run {
            Some(run) => println!("#{run_id}: {} ({})", run.name, run_status_name(run.status)),
            None => println!("#{run_id}: no longer exists"),
        },
        Event::PredictionsFetched { predictions } => {
            for p in predictions {
                let flag = if p.mismatch { "MISMATCH" } else { "" };
                println!(
                    "run #{:<10} predicted_fail={:<5} actual_fail={:<5} {flag}",
                    p.record.run_id,
                    p.record
                        .predicted_result
                        .map_or("-".to_owned(), |v| v.to_string()),
                    p.record
                        .actual_result
                        .map_or("-".to_owned(), |v| v.to_string()),
                );
            }
        }
        Event::CommitsPage {
            items,
            appended,
            has_more,
        } => {
            println!("feed: {} items (+{appended}), has_more={has_more}", items.len());
            for item in items {
                println!("  {} {} — {}", item.id, item.author, item.message);
            }
            return *has_more;
        }
        Event::StatusAlert { message } => eprintln!("ALERT: {message}"),
        Event::FetchError { context, message } => {
            eprintln!("error ({context}): {message}");
            return false;
        }
        Event::MutationOk { description } => println!("ok: {description}"),
        Event::MutationDeclined { description } => println!("declined: {description}"),
        Event::MutationError {
            description,
            message,
        } => {
            eprintln!("failed: {description}: {message}");
            return false;
        }
    }
    true
}
