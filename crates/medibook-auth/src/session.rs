//! Session state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::Role;

/// The signed-in identity, as returned by the login endpoint.
///
/// `role` is kept as the backend sent it so that roles this client does not
/// know about survive a round trip; they are simply never permitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Role name.
    #[serde(default)]
    pub role: String,
    /// Bearer token.
    #[serde(default)]
    pub token: Option<String>,
}

impl Session {
    /// Create a session from raw values.
    pub fn new(role: impl Into<String>, token: Option<String>) -> Self {
        Self {
            role: role.into(),
            token,
        }
    }

    /// Create a signed-in session for a known role.
    pub fn signed_in(role: Role, token: impl Into<String>) -> Self {
        Self::new(role.as_str(), Some(token.into()))
    }

    /// The signed-out session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Bearer token, treating an empty string as absent.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Check if a token is present.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Parsed role, if recognized.
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

/// Holds the current [`Session`] from login to logout.
///
/// Clones share the same session. Subscribers are notified on every login
/// and logout so guarded views can re-evaluate.
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store holding the anonymous session.
    pub fn new() -> Self {
        Self::with_session(Session::anonymous())
    }

    /// Create a store holding `session`, e.g. one restored from disk.
    pub fn with_session(session: Session) -> Self {
        let (tx, _) = watch::channel(session);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the session after a successful login.
    pub fn login(&self, session: Session) {
        tracing::info!(role = %session.role, "session started");
        self.tx.send_replace(session);
    }

    /// Reset to the anonymous session.
    pub fn logout(&self) {
        let previous = self.tx.send_replace(Session::anonymous());
        tracing::info!(role = %previous.role, "session cleared");
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }
}
