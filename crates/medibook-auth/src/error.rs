//! Authorization errors.

use thiserror::Error;

/// Authorization error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Role name not recognized.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// No token in the session.
    #[error("not signed in")]
    NoSession,

    /// Signed in, but the role is not allowed here.
    #[error("role {role:?} is not permitted")]
    RoleNotPermitted { role: String },
}
