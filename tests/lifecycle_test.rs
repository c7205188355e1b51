use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pipewatch::backend::ApiClient;
use pipewatch::engine::{Event, execute_mutation};
use pipewatch::error::Error;
use pipewatch::gate::{AutoApprove, ConfirmationGate, ScriptedGate};
use pipewatch::mutation::{MutationCoordinator, Operation, Outcome, SlotKey};
use pipewatch::session::Session;
use pipewatch::store::ResourceStore;
use pipewatch::types::{RepoStatus, Repository};

fn make_repo(id: u64, status: RepoStatus) -> Repository {
    Repository {
        id,
        url: format!("https://github.com/acme/repo-{id}"),
        name: format!("acme/repo-{id}"),
        status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn setup(server: &MockServer, repos: Vec<Repository>) -> (MutationCoordinator, Mutex<ResourceStore>) {
    let api = Arc::new(ApiClient::new(
        server.uri(),
        Session::new("user-1", "bearer-token"),
        10,
    ));
    let mut store = ResourceStore::new();
    for repo in repos {
        store.upsert_repository(repo);
    }
    (MutationCoordinator::new(api), Mutex::new(store))
}

#[tokio::test]
async fn concurrent_submits_for_one_entity_never_overlap() {
    let server = MockServer::start().await;
    // expect(1) proves the conflicting submit never produced a request.
    Mock::given(method("DELETE"))
        .and(path("/repos/1"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let (coordinator, store) = setup(&server, vec![make_repo(1, RepoStatus::Success)]);

    let first = coordinator.submit(&store, Operation::DeleteRepository { id: 1 });
    let second = coordinator.submit(&store, Operation::DeleteRepository { id: 1 });
    let (first, second) = tokio::join!(first, second);

    assert!(matches!(first, Ok(Outcome::Removed)));
    assert!(
        matches!(second, Err(Error::Conflict)),
        "the racing submit must be rejected as a conflict"
    );
    assert!(store.lock().unwrap().repository(1).is_none());
}

#[tokio::test]
async fn failed_mutation_leaves_store_untouched_and_releases_slot() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/1"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "update failed" })),
        )
        .mount(&server)
        .await;

    let (coordinator, store) = setup(&server, vec![make_repo(1, RepoStatus::Success)]);
    let before = store.lock().unwrap().repository(1).cloned().unwrap();

    let result = coordinator
        .submit(
            &store,
            Operation::UpdateRepository {
                id: 1,
                url: "https://github.com/acme/renamed".to_owned(),
                token: None,
            },
        )
        .await;

    match result {
        Err(Error::Network(message)) => assert_eq!(message, "update failed"),
        _other => panic!("expected a Network error"),
    }
    assert_eq!(
        store.lock().unwrap().repository(1).cloned().unwrap(),
        before,
        "a rejected mutation must not leave partial writes"
    );
    assert!(
        !coordinator.is_in_flight(&SlotKey::Repository(1)),
        "the mutation slot must unlock on failure"
    );
}

#[tokio::test]
async fn validation_failures_never_reach_the_network() {
    let server = MockServer::start().await;
    let (coordinator, store) = setup(&server, vec![]);

    let bad_url = coordinator
        .submit(
            &store,
            Operation::CreateRepository {
                url: "git@github.com:acme/widgets".to_owned(),
                token: format!("ghp_{}", "x".repeat(40)),
            },
        )
        .await;
    assert!(matches!(bad_url, Err(Error::Validation(_))));

    let bad_token = coordinator
        .submit(
            &store,
            Operation::CreateRepository {
                url: "https://github.com/acme/widgets".to_owned(),
                token: "ghp_tooshort".to_owned(),
            },
        )
        .await;
    assert!(matches!(bad_token, Err(Error::Validation(_))));

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty(), "malformed input must not be dispatched");
}

#[tokio::test]
async fn precondition_failures_resolve_locally() {
    let server = MockServer::start().await;
    let (coordinator, store) = setup(&server, vec![make_repo(1, RepoStatus::Pending)]);

    let result = coordinator
        .submit(&store, Operation::DeleteRepository { id: 1 })
        .await;
    assert!(matches!(result, Err(Error::Precondition(_))));
    assert!(store.lock().unwrap().repository(1).is_some());

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn declined_confirmation_leaves_slot_and_store_untouched() {
    let server = MockServer::start().await;
    // Only the second, approved attempt may reach the backend.
    Mock::given(method("DELETE"))
        .and(path("/repos/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (coordinator, store) = setup(&server, vec![make_repo(1, RepoStatus::Success)]);

    let decline = ScriptedGate::new([false]);
    let event = execute_mutation(
        &coordinator,
        &store,
        &decline,
        Operation::DeleteRepository { id: 1 },
    )
    .await;
    assert!(matches!(event, Event::MutationDeclined { .. }));
    assert!(store.lock().unwrap().repository(1).is_some());
    assert!(
        !coordinator.is_in_flight(&SlotKey::Repository(1)),
        "declining must not leave the mutation slot held"
    );

    // A delete issued immediately afterwards proceeds normally.
    let event = execute_mutation(
        &coordinator,
        &store,
        &AutoApprove,
        Operation::DeleteRepository { id: 1 },
    )
    .await;
    assert!(matches!(event, Event::MutationOk { .. }));
    assert!(store.lock().unwrap().repository(1).is_none());
}

struct PanicGate;

impl ConfirmationGate for PanicGate {
    fn request_confirmation(&self, _description: &str) -> bool {
        panic!("the gate must never be consulted for a guarded-off action");
    }
}

#[tokio::test]
async fn guard_rejection_precedes_the_gate() {
    let server = MockServer::start().await;
    let (coordinator, store) = setup(&server, vec![make_repo(1, RepoStatus::Pending)]);

    let event = execute_mutation(
        &coordinator,
        &store,
        &PanicGate,
        Operation::DeleteRepository { id: 1 },
    )
    .await;
    assert!(matches!(event, Event::MutationError { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}
