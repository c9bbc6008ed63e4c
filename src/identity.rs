//! Identity payload and the remote identity-check seam.
//!
//! DESIGN
//! ======
//! The identity service owns the shape of the user record, so it is kept as
//! raw JSON here and compared by value. The check itself is a trait so the
//! resolver can be driven by the HTTP client in production and by scripted
//! mocks in tests.

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

// =============================================================================
// IDENTITY RECORD
// =============================================================================

/// Opaque user identity as returned by the identity endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityRecord(serde_json::Value);

impl IdentityRecord {
    #[must_use]
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Top-level string `id` field, if the payload carries one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(serde_json::Value::as_str)
    }

    #[must_use]
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for IdentityRecord {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

// =============================================================================
// ERROR
// =============================================================================

/// Why an identity check did not produce an identity.
///
/// Consumers of `SessionStatus` never see this; every variant projects to
/// "unauthenticated".
#[derive(Debug, thiserror::Error)]
pub enum IdentityCheckError {
    /// The endpoint rejected the session (401/403).
    #[error("not authenticated: status {status}")]
    Unauthorized { status: u16 },

    /// The request never produced a response.
    #[error("identity request failed: {0}")]
    Transport(String),

    /// Any other non-success status.
    #[error("identity response error: status {status}")]
    Status { status: u16, body: String },

    /// The response body was not a JSON identity payload.
    #[error("identity response parse failed: {0}")]
    Decode(String),
}

/// Compact, comparable classification of a failed check, kept in the cache
/// for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Unauthorized,
    Transport,
    Status(u16),
    Decode,
    /// The attempt ended without an answer, e.g. the check panicked.
    Aborted,
}

impl IdentityCheckError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unauthorized { .. } => FailureKind::Unauthorized,
            Self::Transport(_) => FailureKind::Transport,
            Self::Status { status, .. } => FailureKind::Status(*status),
            Self::Decode(_) => FailureKind::Decode,
        }
    }
}

// =============================================================================
// CHECK TRAIT
// =============================================================================

/// Remote "who am I" check.
#[async_trait::async_trait]
pub trait IdentityCheck: Send + Sync {
    /// Resolve the current session to an identity.
    ///
    /// `Ok(None)` means the endpoint answered successfully without a user.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityCheckError`] if the session is rejected, the
    /// request fails, or the response cannot be decoded.
    async fn fetch_current_identity(&self) -> Result<Option<IdentityRecord>, IdentityCheckError>;
}
