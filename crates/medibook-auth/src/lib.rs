//! Session handling and authorization for the MediBook client.
//!
//! Provides the current user's session, its store, and the role check that
//! decides whether a protected view renders or redirects.

mod error;
mod guard;
mod role;
mod session;

pub use error::AuthError;
pub use guard::{authorize, AccessGuard, CapabilitySet, Decision, DenyReason, Guarded};
pub use role::Role;
pub use session::{Session, SessionStore};
