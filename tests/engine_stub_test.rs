use std::time::Duration;

use chrono::Utc;

use pipewatch::engine::{Engine as _, Event, Request, StubEngine};
use pipewatch::mutation::Operation;
use pipewatch::types::{CommitEvent, Repository};

fn load_fixture_repos() -> Vec<Repository> {
    let json = include_str!("fixtures/stub_repos.json");
    serde_json::from_str(json).expect("valid stub_repos.json fixture")
}

fn make_commits(count: u64) -> Vec<CommitEvent> {
    (1..=count)
        .map(|id| CommitEvent {
            id,
            author: "alice".to_owned(),
            message: format!("commit {id}"),
            run_id: None,
            created_at: Utc::now(),
        })
        .collect()
}

fn recv(rx: &std::sync::mpsc::Receiver<Event>) -> Event {
    rx.recv_timeout(Duration::from_secs(2))
        .expect("engine should reply within 2 seconds")
}

#[test]
fn stub_engine_fetch_repos_returns_fixture_data() {
    let repos = load_fixture_repos();
    assert_eq!(repos.len(), 1, "fixture should have exactly one repository");

    let stub = StubEngine {
        repos: repos.clone(),
        ..Default::default()
    };

    let handle = stub.start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();

    handle.send(Request::FetchRepositories {
        query: String::new(),
        reply_tx: tx,
    });

    match recv(&rx) {
        Event::RepositoriesFetched { repos: fetched } => {
            assert_eq!(fetched.len(), repos.len());
            assert_eq!(fetched[0].id, 42);
            assert_eq!(fetched[0].name, "acme/widgets");
        }
        _other => panic!("expected RepositoriesFetched, got a different event variant"),
    }
}

#[test]
fn stub_engine_applies_list_query() {
    let stub = StubEngine {
        repos: load_fixture_repos(),
        ..Default::default()
    };

    let handle = stub.start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();

    handle.send(Request::FetchRepositories {
        query: "status:failed".to_owned(),
        reply_tx: tx,
    });

    match recv(&rx) {
        Event::RepositoriesFetched { repos } => assert!(repos.is_empty()),
        _other => panic!("expected RepositoriesFetched"),
    }
}

#[test]
fn stub_engine_mutations_succeed_instantly() {
    let stub = StubEngine::default();
    let handle = stub.start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();

    handle.send(Request::Mutate {
        op: Operation::RerunWorkflow { run_id: 1 },
        reply_tx: tx,
    });

    assert!(
        matches!(recv(&rx), Event::MutationOk { .. }),
        "mutation should return MutationOk"
    );
}

#[test]
fn stub_engine_run_detail_returns_none_for_unknown_run() {
    let stub = StubEngine::default();
    let handle = stub.start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();

    handle.send(Request::FetchRunDetail {
        run_id: 999,
        reply_tx: tx,
    });

    assert!(
        matches!(
            recv(&rx),
            Event::RunDetailFetched {
                run_id: 999,
                run: None,
            }
        ),
        "FetchRunDetail on stub should return run: None"
    );
}

#[test]
fn stub_engine_feed_pages_until_exhausted() {
    // 12 items at page size 5: pages of 5, 5, 2, then permanent no-ops.
    let stub = StubEngine {
        commits: make_commits(12),
        feed_page_size: 5,
        ..Default::default()
    };

    let handle = stub.start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();

    let mut lengths = Vec::new();
    for _ in 0..3 {
        handle.send(Request::LoadMoreCommits {
            reply_tx: tx.clone(),
        });
        match recv(&rx) {
            Event::CommitsPage {
                items, has_more, ..
            } => {
                lengths.push((items.len(), has_more));
            }
            _other => panic!("expected CommitsPage"),
        }
    }
    assert_eq!(lengths, vec![(5, true), (10, true), (12, false)]);

    // Exhausted: further loads return the same sequence.
    handle.send(Request::LoadMoreCommits {
        reply_tx: tx.clone(),
    });
    match recv(&rx) {
        Event::CommitsPage {
            items,
            appended,
            has_more,
        } => {
            assert_eq!(items.len(), 12);
            assert_eq!(appended, 0);
            assert!(!has_more);
        }
        _other => panic!("expected CommitsPage"),
    }

    // Reset starts over from the first page.
    handle.send(Request::ResetFeed);
    handle.send(Request::LoadMoreCommits { reply_tx: tx });
    match recv(&rx) {
        Event::CommitsPage {
            items, has_more, ..
        } => {
            assert_eq!(items.len(), 5);
            assert!(has_more);
        }
        _other => panic!("expected CommitsPage"),
    }
}
