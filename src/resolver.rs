//! Session status resolver for one consuming context.
//!
//! SYSTEM CONTEXT
//! ==============
//! A page (or any other consumer) mounts a resolver, calls `resolve()`, and
//! reads `status()`. Every mounted resolver in the process shares one
//! `SessionCache`, so they coordinate through it and never with each other.
//!
//! DESIGN
//! ======
//! `resolve()` claims the cache entry and spawns the check; the spawned task
//! is the only writer of the settled outcome. Failures are absorbed there
//! and stored as `Resolution::Failed`, which projects to "unauthenticated".
//! Nothing retries.
//!
//! Each resolver keeps its own committed status. The commit is latched: once
//! the local status is settled, an unsettled projection (after an
//! invalidation) does not replace it. A later settled outcome does.
//!
//! Dropping a resolver does not cancel a spawned check. Its outcome still
//! lands in the cache for the next context. A check that panics drops its
//! ticket, which settles the entry as aborted (unauthenticated).

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;

use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;

use crate::cache::{CURRENT_IDENTITY, QueryKey, Resolution, SessionCache};
use crate::identity::IdentityCheck;
use crate::status::{SessionStatus, project};

pub struct SessionStatusResolver {
    cache: SessionCache,
    check: Arc<dyn IdentityCheck>,
    key: QueryKey,
    local: Mutex<SessionStatus>,
}

impl SessionStatusResolver {
    /// Mount a context that resolves the current session identity.
    #[must_use]
    pub fn mount(cache: SessionCache, check: Arc<dyn IdentityCheck>) -> Self {
        Self::mount_with_key(cache, check, CURRENT_IDENTITY)
    }

    #[must_use]
    pub fn mount_with_key(cache: SessionCache, check: Arc<dyn IdentityCheck>, key: QueryKey) -> Self {
        Self { cache, check, key, local: Mutex::new(SessionStatus::pending()) }
    }

    #[must_use]
    pub fn key(&self) -> QueryKey {
        self.key
    }

    /// Issue the identity check unless one is already in flight or settled.
    ///
    /// Returns immediately; the outcome shows up in [`Self::status`].
    /// Outside a Tokio runtime this logs and does nothing, leaving the entry
    /// idle for a later call.
    pub fn resolve(&self) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(key = %self.key, "no async runtime; identity check not issued");
            return;
        };
        let Some(ticket) = self.cache.begin(self.key) else {
            tracing::trace!(key = %self.key, "identity check already in flight or settled");
            return;
        };

        let cache = self.cache.clone();
        let check = Arc::clone(&self.check);
        runtime.spawn(async move {
            let resolution = run_check(check.as_ref()).await;
            cache.complete(ticket, resolution);
        });
    }

    /// Current status. Never waits on the network.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.commit(project(&self.cache.peek(self.key)))
    }

    /// Wait until the check for this key has settled, then return the status.
    ///
    /// Does not issue a check itself; pair with [`Self::resolve`]. When the
    /// entry is idle (invalidated, nothing issued) and this context has
    /// already settled, returns the latched status instead of waiting. A
    /// context that has never settled waits for someone to resolve.
    pub async fn wait_settled(&self) -> SessionStatus {
        let mut rx = self.cache.subscribe(self.key);
        let idle = matches!(*rx.borrow(), Resolution::Idle);
        if idle {
            let latched = self.status();
            if latched.is_settled() {
                return latched;
            }
        }
        let projected = rx
            .wait_for(Resolution::is_settled)
            .await
            .map(|resolution| project(&resolution))
            .unwrap_or_else(|_| project(&self.cache.peek(self.key)));
        self.commit(projected)
    }

    /// Drop the cached outcome and issue a fresh check.
    ///
    /// This context keeps reporting its previous settled status until the
    /// new check settles.
    pub fn refresh(&self) {
        self.cache.invalidate(self.key);
        self.resolve();
    }

    fn commit(&self, projected: SessionStatus) -> SessionStatus {
        let mut local = self
            .local
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if projected.is_settled() || !local.is_settled() {
            if *local != projected {
                tracing::debug!(
                    key = %self.key,
                    authenticated = projected.is_authenticated(),
                    settled = projected.is_settled(),
                    "session status changed"
                );
                *local = projected;
            }
        }
        local.clone()
    }
}

async fn run_check(check: &dyn IdentityCheck) -> Resolution {
    match check.fetch_current_identity().await {
        Ok(identity) => Resolution::Succeeded(identity),
        Err(e) => {
            tracing::debug!(error = %e, "identity check failed; treating session as unauthenticated");
            Resolution::Failed(e.kind())
        }
    }
}
