//! Re-observe a [`FetchState`] whenever its locator changes.
//!
//! Locators are published through a `tokio::sync::watch` channel. Both
//! functions here must run inside a tokio runtime.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::FetchState;

/// Drive `state` from a stream of locator values.
///
/// Observes the current locator immediately, then again after every
/// change. Requests run concurrently; stale ones are discarded by the
/// state itself. Returns once the locator sender is dropped and every
/// started request has finished, yielding the number of requests started.
pub async fn follow<T>(state: FetchState<T>, mut locators: watch::Receiver<String>) -> usize
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    let mut in_flight = JoinSet::new();
    let mut started = 0;

    loop {
        let locator = locators.borrow_and_update().clone();
        if let Some(task) = state.observe(locator) {
            in_flight.spawn(task.run());
            started += 1;
        }

        // Reap finished requests while waiting for the next locator.
        let open = loop {
            tokio::select! {
                changed = locators.changed() => break changed.is_ok(),
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            }
        };

        if !open {
            break;
        }
    }

    while in_flight.join_next().await.is_some() {}
    tracing::debug!(started, "locator source closed");
    started
}

/// Forward a locator only once it has been stable for `quiet`.
///
/// Bursts of changes (keystrokes in a search box) collapse into their last
/// value. When `source` closes, the latest value is flushed before the
/// returned receiver closes.
pub fn debounce(mut source: watch::Receiver<String>, quiet: Duration) -> watch::Receiver<String> {
    let initial = source.borrow_and_update().clone();
    let (tx, rx) = watch::channel(initial);

    tokio::spawn(async move {
        while source.changed().await.is_ok() {
            let open = loop {
                match tokio::time::timeout(quiet, source.changed()).await {
                    Ok(Ok(())) => continue,
                    Ok(Err(_)) => break false,
                    Err(_) => break true,
                }
            };

            let latest = source.borrow_and_update().clone();
            tx.send_if_modified(|current| {
                if *current == latest {
                    return false;
                }
                *current = latest;
                true
            });

            if !open || tx.is_closed() {
                return;
            }
        }
    });

    rx
}
