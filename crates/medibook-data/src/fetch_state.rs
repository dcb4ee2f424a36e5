//! Fetch-state tracking keyed on a locator.
//!
//! A [`FetchState`] owns one result slot. Each call to
//! [`FetchState::observe`] with a new locator stamps a new generation on the
//! slot and hands back a [`FetchTask`]; when a task completes it may only
//! write its outcome if its generation is still current. The last locator
//! observed wins, regardless of the order in which responses arrive.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

use crate::{ApiClient, FetchError};

/// Broad class of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The request never completed.
    Transport,
    /// The backend reported failure.
    Application,
    /// The payload had an unexpected shape.
    Decode,
}

/// The error half of a [`FetchResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    /// Human-readable message, suitable for display as-is.
    pub message: String,
    /// Failure class.
    pub kind: FailureKind,
    /// HTTP status, when the backend answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<FetchError> for FetchFailure {
    fn from(err: FetchError) -> Self {
        let kind = match &err {
            FetchError::Transport(_) | FetchError::InvalidUrl(_) => FailureKind::Transport,
            FetchError::Application { .. } => FailureKind::Application,
            FetchError::Decode(_) => FailureKind::Decode,
        };
        Self {
            message: err.message(),
            kind,
            status: err.status(),
        }
    }
}

/// Tri-state value exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult<T> {
    /// Last successfully retrieved payload.
    pub data: Option<T>,
    /// True while a request for the current locator is in flight.
    pub loading: bool,
    /// Set when the most recent request failed.
    pub error: Option<FetchFailure>,
}

impl<T> Default for FetchResult<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> FetchResult<T> {
    /// Check if the last request finished without error and produced data.
    pub fn is_ready(&self) -> bool {
        !self.loading && self.error.is_none() && self.data.is_some()
    }

    /// Error message, if the last request failed.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

#[derive(Debug)]
struct Slot<T> {
    locator: Option<String>,
    generation: u64,
    result: FetchResult<T>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            locator: None,
            generation: 0,
            result: FetchResult::default(),
        }
    }

    /// Start a request for `locator`. Data is kept so callers can render
    /// the previous payload while the next one loads.
    fn begin(&mut self, locator: String) -> u64 {
        self.generation += 1;
        self.locator = Some(locator);
        self.result.loading = true;
        self.result.error = None;
        self.generation
    }
}

/// Tracks `{loading, data, error}` for whatever locator was observed last.
///
/// Clones share the same slot.
pub struct FetchState<T> {
    client: ApiClient,
    slot: Arc<watch::Sender<Slot<T>>>,
}

impl<T> Clone for FetchState<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> FetchState<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create an empty state that reads through `client`.
    pub fn new(client: ApiClient) -> Self {
        let (slot, _) = watch::channel(Slot::new());
        Self {
            client,
            slot: Arc::new(slot),
        }
    }

    /// Observe `locator`.
    ///
    /// Returns the request to run when `locator` differs from the one
    /// currently observed, and `None` otherwise. The returned task must be
    /// run (or spawned) for `loading` to clear.
    pub fn observe(&self, locator: impl Into<String>) -> Option<FetchTask<T>> {
        let locator = locator.into();
        let mut started = None;
        self.slot.send_if_modified(|slot| {
            if slot.locator.as_deref() == Some(locator.as_str()) {
                return false;
            }
            started = Some(slot.begin(locator.clone()));
            true
        });

        let generation = started?;
        tracing::debug!(locator = %locator, generation, "fetch started");
        Some(self.task(locator, generation))
    }

    /// Force a new request for the current locator.
    ///
    /// Returns `None` if nothing has been observed yet.
    pub fn refetch(&self) -> Option<FetchTask<T>> {
        let mut started = None;
        self.slot.send_if_modified(|slot| match slot.locator.clone() {
            Some(locator) => {
                let generation = slot.begin(locator.clone());
                started = Some((locator, generation));
                true
            }
            None => false,
        });

        let (locator, generation) = started?;
        tracing::debug!(locator = %locator, generation, "refetch started");
        Some(self.task(locator, generation))
    }

    /// Current result.
    pub fn snapshot(&self) -> FetchResult<T> {
        self.slot.borrow().result.clone()
    }

    /// Locator currently observed.
    pub fn locator(&self) -> Option<String> {
        self.slot.borrow().locator.clone()
    }

    /// Subscribe to result changes.
    pub fn subscribe(&self) -> FetchWatch<T> {
        FetchWatch {
            rx: self.slot.subscribe(),
        }
    }

    fn task(&self, locator: String, generation: u64) -> FetchTask<T> {
        FetchTask {
            client: self.client.clone(),
            slot: Arc::clone(&self.slot),
            locator,
            generation,
        }
    }
}

/// One in-flight read started by [`FetchState::observe`] or
/// [`FetchState::refetch`].
#[must_use = "the request does nothing unless run or spawned"]
pub struct FetchTask<T> {
    client: ApiClient,
    slot: Arc<watch::Sender<Slot<T>>>,
    locator: String,
    generation: u64,
}

impl<T> FetchTask<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Locator this task reads.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Generation stamped on this task.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Perform the request and apply its outcome.
    ///
    /// Returns `false` when the outcome was discarded because a newer
    /// request superseded this one.
    pub async fn run(self) -> bool {
        let outcome = self.client.get_data::<T>(&self.locator).await;
        self.apply(outcome)
    }

    /// Run the request on the tokio runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<bool> {
        tokio::spawn(self.run())
    }

    fn apply(&self, outcome: Result<T, FetchError>) -> bool {
        let generation = self.generation;
        let failure = outcome.as_ref().err().map(FetchError::message);

        let applied = self.slot.send_if_modified(|slot| {
            if slot.generation != generation {
                return false;
            }
            match outcome {
                Ok(data) => {
                    slot.result.data = Some(data);
                    slot.result.error = None;
                }
                Err(err) => slot.result.error = Some(err.into()),
            }
            slot.result.loading = false;
            true
        });

        match (applied, failure) {
            (false, _) => {
                tracing::debug!(locator = %self.locator, generation, "discarding stale result")
            }
            (true, Some(message)) => {
                tracing::warn!(locator = %self.locator, generation, error = %message, "fetch failed")
            }
            (true, None) => tracing::debug!(locator = %self.locator, generation, "fetch completed"),
        }
        applied
    }
}

/// Push subscription to a [`FetchState`]'s result.
pub struct FetchWatch<T> {
    rx: watch::Receiver<Slot<T>>,
}

impl<T: Clone> FetchWatch<T> {
    /// Current result.
    pub fn current(&self) -> FetchResult<T> {
        self.rx.borrow().result.clone()
    }

    /// Locator the result belongs to.
    pub fn locator(&self) -> Option<String> {
        self.rx.borrow().locator.clone()
    }

    /// Wait for the next change and return the new result.
    ///
    /// Returns `None` once the state and all of its tasks are dropped.
    pub async fn changed(&mut self) -> Option<FetchResult<T>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().result.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HttpTransport, Response};
    use serde_json::json;

    fn state() -> FetchState<Vec<String>> {
        FetchState::new(ApiClient::new(HttpTransport::new()).with_base_url("http://api.invalid"))
    }

    // === Observation Tests ===

    #[test]
    fn test_initial_state_is_idle() {
        let state = state();
        assert_eq!(state.snapshot(), FetchResult::default());
        assert_eq!(state.locator(), None);
    }

    #[test]
    fn test_observe_marks_loading() {
        let state = state();
        let task = state.observe("/doctors").unwrap();
        assert_eq!(task.locator(), "/doctors");
        assert_eq!(task.generation(), 1);

        let snapshot = state.snapshot();
        assert!(snapshot.loading);
        assert!(snapshot.error.is_none());
        assert_eq!(state.locator().as_deref(), Some("/doctors"));
    }

    #[test]
    fn test_observe_same_locator_is_noop() {
        let state = state();
        let _first = state.observe("/doctors").unwrap();
        assert!(state.observe("/doctors").is_none());
        assert!(state.observe(String::from("/doctors")).is_none());
    }

    #[test]
    fn test_refetch_without_locator() {
        let state = state();
        assert!(state.refetch().is_none());
    }

    #[test]
    fn test_refetch_bumps_generation() {
        let state = state();
        let first = state.observe("/doctors").unwrap();
        let second = state.refetch().unwrap();
        assert_eq!(second.locator(), "/doctors");
        assert!(second.generation() > first.generation());
    }

    // === Apply Tests ===

    #[test]
    fn test_apply_success() {
        let state = state();
        let task = state.observe("/doctors").unwrap();
        assert!(task.apply(Ok(vec!["Dr. Smith".to_string()])));

        let snapshot = state.snapshot();
        assert!(snapshot.is_ready());
        assert_eq!(snapshot.data, Some(vec!["Dr. Smith".to_string()]));
    }

    #[test]
    fn test_apply_failure_keeps_data() {
        let state = state();
        let first = state.observe("/doctors").unwrap();
        assert!(first.apply(Ok(vec!["Dr. Smith".to_string()])));

        let second = state.refetch().unwrap();
        let err = Response::json_body(503, &json!({"message": "Service unavailable"}))
            .into_data::<Vec<String>>()
            .unwrap_err();
        assert!(second.apply(Err(err)));

        let snapshot = state.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.data, Some(vec!["Dr. Smith".to_string()]));
        assert_eq!(snapshot.error_message(), Some("Service unavailable"));
        assert_eq!(snapshot.error.unwrap().kind, FailureKind::Application);
    }

    #[test]
    fn test_stale_apply_is_discarded() {
        let state = state();
        let old = state.observe("/doctors?query=a").unwrap();
        let new = state.observe("/doctors?query=ab").unwrap();

        assert!(new.apply(Ok(vec!["new".to_string()])));
        assert!(!old.apply(Ok(vec!["old".to_string()])));
        assert_eq!(state.snapshot().data, Some(vec!["new".to_string()]));
    }

    #[test]
    fn test_locator_change_keeps_previous_data_while_loading() {
        let state = state();
        let first = state.observe("/doctors").unwrap();
        assert!(first.apply(Ok(vec!["Dr. Smith".to_string()])));

        let _second = state.observe("/doctors?query=derm").unwrap();
        let snapshot = state.snapshot();
        assert!(snapshot.loading);
        assert_eq!(snapshot.data, Some(vec!["Dr. Smith".to_string()]));
    }

    #[test]
    fn test_new_request_clears_error() {
        let state = state();
        let first = state.observe("/doctors").unwrap();
        assert!(first.apply(Err(FetchError::Transport("refused".to_string()))));
        assert_eq!(state.snapshot().error.unwrap().kind, FailureKind::Transport);

        let _second = state.observe("/doctors?query=x").unwrap();
        let snapshot = state.snapshot();
        assert!(snapshot.loading);
        assert!(snapshot.error.is_none());
    }

    // === Subscription Tests ===

    #[tokio::test]
    async fn test_subscribe_sees_transitions() {
        let state = state();
        let mut watch = state.subscribe();

        let task = state.observe("/doctors").unwrap();
        assert!(watch.changed().await.unwrap().loading);
        assert_eq!(watch.locator().as_deref(), Some("/doctors"));

        task.apply(Ok(vec![]));
        let result = watch.changed().await.unwrap();
        assert!(!result.loading);
        assert_eq!(result.data, Some(vec![]));
        assert_eq!(watch.current(), result);
    }

    #[tokio::test]
    async fn test_watch_ends_when_state_dropped() {
        let state = state();
        let mut watch = state.subscribe();
        drop(state);
        assert!(watch.changed().await.is_none());
    }

    #[test]
    fn test_failure_serializes_without_status() {
        let failure = FetchFailure::from(FetchError::Transport("refused".to_string()));
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            json!({"message": "refused", "kind": "transport"})
        );
    }
}
