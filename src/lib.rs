//! Session status: single source of truth for "who is signed in".
//!
//! SYSTEM CONTEXT
//! ==============
//! Client code asks one question: is the current session valid, and if so,
//! for whom. This crate answers it with a cached, single-flight call to the
//! identity endpoint and a small four-field status record that UI code
//! branches on.
//!
//! DESIGN
//! ======
//! - `identity` defines the opaque identity payload and the `IdentityCheck`
//!   seam to the remote "who am I" endpoint.
//! - `http` is the `reqwest` implementation of that seam.
//! - `cache` owns resolution state per query key. It is the only place
//!   concurrent consumers meet, and it enforces at-most-one attempt per key.
//! - `status` is the pure projection from cache state to `SessionStatus`.
//! - `resolver` ties them together for one consuming context.

pub mod cache;
pub mod config;
pub mod http;
pub mod identity;
pub mod resolver;
pub mod status;

pub use cache::{CURRENT_IDENTITY, QueryKey, Resolution, SessionCache};
pub use config::{ConfigError, SessionConfig};
pub use http::HttpIdentityCheck;
pub use identity::{FailureKind, IdentityCheck, IdentityCheckError, IdentityRecord};
pub use resolver::SessionStatusResolver;
pub use status::{SessionStatus, project, requires_login};
