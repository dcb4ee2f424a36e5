//! End-to-end behavior of `FetchState` over a scripted transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use medibook_data::{
    follow, ApiClient, FailureKind, FetchError, FetchResult, FetchState, Request, Response,
    Transport,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{oneshot, watch};

const BASE: &str = "http://api.test/api/v1";

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Doctor {
    #[serde(rename = "_id")]
    id: String,
    name: String,
}

fn doctor(id: &str, name: &str) -> Doctor {
    Doctor {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn doctors_body(doctors: &[(&str, &str)]) -> Response {
    let data: Vec<_> = doctors
        .iter()
        .map(|(id, name)| json!({"_id": id, "name": name}))
        .collect();
    Response::json_body(200, &json!({"success": true, "data": data}))
}

/// Transport whose responses are released by the test, one gate per URL.
#[derive(Default)]
struct GatedTransport {
    requests: Mutex<Vec<Request>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<Response>>>,
}

impl GatedTransport {
    /// Register a gate for `locator`; the request resolves once the returned
    /// sender fires.
    fn gate(&self, locator: &str) -> oneshot::Sender<Response> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .insert(format!("{}{}", BASE, locator), rx);
        tx
    }

    fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn send(&self, request: Request) -> Result<Response, FetchError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        let gate = self.gates.lock().unwrap().remove(&url);
        match gate {
            Some(rx) => rx
                .await
                .map_err(|_| FetchError::Transport("connection reset".to_string())),
            None => Err(FetchError::Transport(format!("no route to {}", url))),
        }
    }
}

fn setup() -> (Arc<GatedTransport>, FetchState<Vec<Doctor>>) {
    let transport = Arc::new(GatedTransport::default());
    let client = ApiClient::from_shared(transport.clone()).with_base_url(BASE);
    (transport, FetchState::new(client))
}

// === Scenarios ===

#[tokio::test]
async fn test_doctors_list_success() {
    let (transport, state) = setup();
    transport
        .gate("/doctors")
        .send(doctors_body(&[("1", "Dr. Smith")]))
        .unwrap();

    let applied = state.observe("/doctors").unwrap().run().await;
    assert!(applied);

    assert_eq!(
        state.snapshot(),
        FetchResult {
            data: Some(vec![doctor("1", "Dr. Smith")]),
            loading: false,
            error: None,
        }
    );
}

#[tokio::test]
async fn test_doctors_list_http_error() {
    let (transport, state) = setup();
    transport
        .gate("/doctors")
        .send(Response::json_body(500, &json!({"message": "Network error"})))
        .unwrap();

    state.observe("/doctors").unwrap().run().await;

    let result = state.snapshot();
    assert!(!result.loading);
    assert_eq!(result.data, None);
    assert_eq!(result.error_message(), Some("Network error"));
    assert_eq!(result.error.unwrap().kind, FailureKind::Application);
}

#[tokio::test]
async fn test_transport_failure_surfaces_message() {
    let (_transport, state) = setup();

    state.observe("/doctors").unwrap().run().await;

    let result = state.snapshot();
    assert!(!result.loading);
    let failure = result.error.unwrap();
    assert_eq!(failure.kind, FailureKind::Transport);
    assert_eq!(failure.message, format!("no route to {}/doctors", BASE));
}

// === Properties ===

#[tokio::test]
async fn test_same_locator_issues_one_request() {
    let (transport, state) = setup();
    transport
        .gate("/doctors")
        .send(doctors_body(&[("1", "Dr. Smith")]))
        .unwrap();

    let first = state.observe("/doctors");
    let second = state.observe("/doctors");
    assert!(second.is_none());
    first.unwrap().run().await;

    // Still the same locator after completion.
    assert!(state.observe("/doctors").is_none());
    assert_eq!(transport.urls(), vec![format!("{}/doctors", BASE)]);
}

#[tokio::test]
async fn test_last_locator_wins_over_last_completion() {
    let pairs = [
        ("/doctors?query=a", "/doctors?query=ab"),
        ("/doctors", "/doctors?query=smith"),
        ("/doctors/1", "/doctors/2"),
    ];

    for (first, second) in pairs {
        let (transport, state) = setup();
        let first_gate = transport.gate(first);
        let second_gate = transport.gate(second);

        let slow = state.observe(first).unwrap().spawn();
        let fast = state.observe(second).unwrap().spawn();

        second_gate.send(doctors_body(&[("2", second)])).unwrap();
        assert!(fast.await.unwrap());
        assert!(state.snapshot().is_ready());

        first_gate.send(doctors_body(&[("1", first)])).unwrap();
        assert!(!slow.await.unwrap());

        let result = state.snapshot();
        assert_eq!(result.data, Some(vec![doctor("2", second)]));
        assert!(!result.loading);
        assert!(result.error.is_none());
        assert_eq!(state.locator().as_deref(), Some(second));
    }
}

#[tokio::test]
async fn test_stale_failure_does_not_set_error() {
    let (transport, state) = setup();
    let first_gate = transport.gate("/doctors?query=x");
    let second_gate = transport.gate("/doctors?query=xy");

    let slow = state.observe("/doctors?query=x").unwrap().spawn();
    let fast = state.observe("/doctors?query=xy").unwrap().spawn();

    second_gate.send(doctors_body(&[])).unwrap();
    assert!(fast.await.unwrap());

    drop(first_gate);
    assert!(!slow.await.unwrap());
    assert!(state.snapshot().error.is_none());
}

#[tokio::test]
async fn test_failure_keeps_prior_data() {
    let (transport, state) = setup();
    transport
        .gate("/doctors")
        .send(doctors_body(&[("1", "Dr. Smith")]))
        .unwrap();
    state.observe("/doctors").unwrap().run().await;

    transport
        .gate("/doctors")
        .send(Response::json_body(
            200,
            &json!({"success": false, "message": "Database unavailable"}),
        ))
        .unwrap();
    state.refetch().unwrap().run().await;

    let result = state.snapshot();
    assert_eq!(result.data, Some(vec![doctor("1", "Dr. Smith")]));
    assert_eq!(result.error_message(), Some("Database unavailable"));
    assert!(!result.loading);
}

#[tokio::test]
async fn test_bearer_token_reaches_transport() {
    let transport = Arc::new(GatedTransport::default());
    let client = ApiClient::from_shared(transport.clone())
        .with_base_url(BASE)
        .with_token(Some("test-token".to_string()));
    let state: FetchState<Vec<Doctor>> = FetchState::new(client);
    transport.gate("/bookings/my-appointments").send(doctors_body(&[])).unwrap();

    state.observe("/bookings/my-appointments").unwrap().run().await;

    let requests = transport.requests.lock().unwrap();
    assert_eq!(requests[0].header("Authorization"), Some("Bearer test-token"));
}

// === Reactive Driver ===

#[tokio::test]
async fn test_follow_tracks_latest_locator() {
    let (transport, state) = setup();
    let first_gate = transport.gate("/doctors?query=");
    transport
        .gate("/doctors?query=smith")
        .send(doctors_body(&[("1", "Dr. Smith")]))
        .unwrap();

    let mut results = state.subscribe();
    let (tx, rx) = watch::channel("/doctors?query=".to_string());
    let driver = tokio::spawn(follow(state.clone(), rx));

    // Wait for the initial locator to be picked up.
    assert!(results.changed().await.unwrap().loading);
    assert_eq!(results.locator().as_deref(), Some("/doctors?query="));

    tx.send("/doctors?query=smith".to_string()).unwrap();
    // Re-sending the same locator must not start another request.
    tx.send("/doctors?query=smith".to_string()).unwrap();

    loop {
        let result = results.changed().await.unwrap();
        if result.data.is_some() {
            assert_eq!(result.data, Some(vec![doctor("1", "Dr. Smith")]));
            break;
        }
    }

    first_gate.send(doctors_body(&[("9", "Dr. Stale")])).unwrap();
    drop(tx);

    assert_eq!(driver.await.unwrap(), 2);
    assert_eq!(state.snapshot().data, Some(vec![doctor("1", "Dr. Smith")]));
    assert_eq!(transport.urls().len(), 2);
}
