//! Public session status record and its projection from cache state.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route guards and user-aware views branch on this record. It is derived,
//! never written by consumers: `project` is the only way to build a settled
//! status, which keeps the field invariants in one place.
//!
//! INVARIANTS
//! ==========
//! - `loading == !settled`
//! - `authenticated == identity.is_some()`

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;

use serde::Serialize;

use crate::cache::Resolution;
use crate::identity::IdentityRecord;

/// Authentication status for the current browser user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionStatus {
    identity: Option<IdentityRecord>,
    loading: bool,
    authenticated: bool,
    settled: bool,
}

impl SessionStatus {
    /// The status a consuming context starts with.
    #[must_use]
    pub fn pending() -> Self {
        Self { identity: None, loading: true, authenticated: false, settled: false }
    }

    fn settled_with(identity: Option<IdentityRecord>) -> Self {
        Self { authenticated: identity.is_some(), identity, loading: false, settled: true }
    }

    #[must_use]
    pub fn identity(&self) -> Option<&IdentityRecord> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::pending()
    }
}

/// Map a cache resolution to the public status.
///
/// Every failure, whatever its kind, projects to the same unauthenticated
/// status.
#[must_use]
pub fn project(resolution: &Resolution) -> SessionStatus {
    match resolution {
        Resolution::Idle | Resolution::InFlight => SessionStatus::pending(),
        Resolution::Succeeded(identity) => SessionStatus::settled_with(identity.clone()),
        Resolution::Failed(_) => SessionStatus::settled_with(None),
    }
}

/// True once the check has settled without an authenticated user.
#[must_use]
pub fn requires_login(status: &SessionStatus) -> bool {
    status.settled && !status.authenticated
}
