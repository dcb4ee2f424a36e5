//! Role-based access guard.

use std::collections::BTreeSet;
use std::fmt;

use medibook_core::GuardConfig;
use serde::Serialize;

use crate::{AuthError, Role, Session};

/// The set of roles permitted to access a protected view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(BTreeSet<Role>);

impl CapabilitySet {
    /// Create a set from roles.
    pub fn of(roles: impl IntoIterator<Item = Role>) -> Self {
        Self(roles.into_iter().collect())
    }

    /// Parse role names, failing on the first unknown one.
    pub fn parse<I, S>(names: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| name.as_ref().parse::<Role>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    /// Check if `role` is in the set.
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Check if the set is empty (nobody is permitted).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the roles in the set.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Role> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self::of(iter)
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|r| r.as_str()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No token in the session.
    NoSession,
    /// Token present, role not in the capability set.
    RoleNotPermitted,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSession => write!(f, "no session"),
            Self::RoleNotPermitted => write!(f, "role not permitted"),
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    /// Render the protected content.
    Allow,
    /// Redirect instead.
    Deny(DenyReason),
}

impl Decision {
    /// Check if access is allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Deny reason, if denied.
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(*reason),
        }
    }
}

/// Decide whether `session` may access a view restricted to `required`.
///
/// Allowed iff the session has a token and its role is in `required`.
pub fn authorize(required: &CapabilitySet, session: &Session) -> Decision {
    if !session.is_authenticated() {
        return Decision::Deny(DenyReason::NoSession);
    }
    match session.role() {
        Some(role) if required.contains(role) => Decision::Allow,
        _ => Decision::Deny(DenyReason::RoleNotPermitted),
    }
}

/// Result of guarding a piece of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<C> {
    /// Content passes through unchanged.
    Render(C),
    /// Navigate away instead of rendering.
    Redirect {
        /// Destination path.
        to: String,
        /// Why access was denied.
        reason: DenyReason,
    },
}

impl<C> Guarded<C> {
    /// Content, if it may be rendered.
    pub fn into_content(self) -> Option<C> {
        match self {
            Guarded::Render(content) => Some(content),
            Guarded::Redirect { .. } => None,
        }
    }

    /// Redirect destination, if denied.
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Guarded::Render(_) => None,
            Guarded::Redirect { to, .. } => Some(to),
        }
    }
}

/// Guard for a single protected view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGuard {
    required: CapabilitySet,
    redirect_to: String,
}

impl AccessGuard {
    /// Create a guard redirecting denied sessions to the default destination.
    pub fn new(required: CapabilitySet) -> Self {
        Self::from_config(&GuardConfig::default(), required)
    }

    /// Create a guard using the configured redirect destination.
    pub fn from_config(config: &GuardConfig, required: CapabilitySet) -> Self {
        Self {
            required,
            redirect_to: config.redirect_to.clone(),
        }
    }

    /// Override the redirect destination.
    pub fn with_redirect(mut self, to: impl Into<String>) -> Self {
        self.redirect_to = to.into();
        self
    }

    /// Roles allowed through.
    pub fn required(&self) -> &CapabilitySet {
        &self.required
    }

    /// Where denied sessions are sent.
    pub fn redirect_to(&self) -> &str {
        &self.redirect_to
    }

    /// Evaluate `session` against this guard.
    pub fn authorize(&self, session: &Session) -> Decision {
        let decision = authorize(&self.required, session);
        if let Decision::Deny(reason) = decision {
            tracing::debug!(
                role = %session.role,
                required = %self.required,
                %reason,
                "access denied"
            );
        }
        decision
    }

    /// Pass `content` through or replace it with a redirect.
    pub fn guard<C>(&self, session: &Session, content: C) -> Guarded<C> {
        match self.authorize(session) {
            Decision::Allow => Guarded::Render(content),
            Decision::Deny(reason) => Guarded::Redirect {
                to: self.redirect_to.clone(),
                reason,
            },
        }
    }

    /// Evaluate `session`, mapping a deny onto [`AuthError`].
    pub fn check(&self, session: &Session) -> Result<(), AuthError> {
        match self.authorize(session) {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::NoSession) => Err(AuthError::NoSession),
            Decision::Deny(DenyReason::RoleNotPermitted) => Err(AuthError::RoleNotPermitted {
                role: session.role.clone(),
            }),
        }
    }
}
