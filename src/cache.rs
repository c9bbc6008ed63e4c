//! Query cache for identity resolutions.
//!
//! DESIGN
//! ======
//! One entry per `QueryKey`, created lazily as `Idle` and never evicted.
//! A settled entry stays fresh until someone calls `invalidate`.
//!
//! `begin` is the single-flight gate: it flips `Idle` to `InFlight` under the
//! lock and hands out a `Ticket`, so at most one caller ever holds the right
//! to issue the remote check for a key. The ticket carries the entry
//! generation; `invalidate` bumps the generation, which makes any completion
//! still in flight from before the invalidation a no-op. A ticket dropped
//! without completing settles its entry as `Failed(Aborted)`.
//!
//! Each entry publishes its state on a `watch` channel so consumers can await
//! the settle without polling.

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::identity::{FailureKind, IdentityRecord};

// =============================================================================
// KEYS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey(&'static str);

impl QueryKey {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Key under which the current session's identity is cached.
pub const CURRENT_IDENTITY: QueryKey = QueryKey::new("current-identity");

// =============================================================================
// RESOLUTION
// =============================================================================

/// State of one cache entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// No attempt has been made since creation or the last invalidation.
    Idle,
    /// An attempt has been issued and has not completed.
    InFlight,
    /// The check answered; `None` when it answered without a user.
    Succeeded(Option<IdentityRecord>),
    /// The check did not succeed.
    Failed(FailureKind),
}

impl Resolution {
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }
}

/// Exclusive right to settle one entry for one generation.
///
/// Dropping a ticket without a settled completion (a panicking check, a
/// spawn that never ran) settles the entry as `Failed(Aborted)` so it cannot
/// stay in flight forever.
#[must_use = "a dropped ticket settles the entry as aborted"]
pub struct Ticket {
    cache: SessionCache,
    key: QueryKey,
    generation: u64,
    disarmed: bool,
}

impl Ticket {
    #[must_use]
    pub fn key(&self) -> QueryKey {
        self.key
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if !self.disarmed {
            self.cache.abandon(self.key, self.generation);
        }
    }
}

// =============================================================================
// CACHE
// =============================================================================

struct Entry {
    generation: u64,
    state: watch::Sender<Resolution>,
}

impl Entry {
    fn new() -> Self {
        let (state, _) = watch::channel(Resolution::Idle);
        Self { generation: 0, state }
    }
}

/// Shared resolution cache. Clones share the same entries.
#[derive(Clone, Default)]
pub struct SessionCache {
    entries: Arc<Mutex<HashMap<QueryKey, Entry>>>,
}

impl SessionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the right to run the check for `key`.
    ///
    /// Returns `None` when an attempt is already in flight or settled.
    pub fn begin(&self, key: QueryKey) -> Option<Ticket> {
        let mut entries = self.lock();
        let entry = entries.entry(key).or_insert_with(Entry::new);
        if *entry.state.borrow() != Resolution::Idle {
            return None;
        }
        entry.state.send_replace(Resolution::InFlight);
        tracing::debug!(%key, generation = entry.generation, "identity check started");
        Some(Ticket { cache: self.clone(), key, generation: entry.generation, disarmed: false })
    }

    /// Store the outcome of the attempt that `ticket` was issued for.
    ///
    /// Returns `false` and leaves the entry untouched when the entry was
    /// invalidated after the ticket was issued. An unsettled `resolution` is
    /// rejected and the entry is settled as aborted.
    pub fn complete(&self, mut ticket: Ticket, resolution: Resolution) -> bool {
        if !resolution.is_settled() {
            tracing::warn!(key = %ticket.key, ?resolution, "rejecting unsettled completion");
            return false;
        }
        ticket.disarmed = true;
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(&ticket.key) else {
            return false;
        };
        if entry.generation != ticket.generation {
            tracing::debug!(
                key = %ticket.key,
                stale = ticket.generation,
                current = entry.generation,
                "discarding identity check result from before invalidation"
            );
            return false;
        }
        entry.state.send_replace(resolution);
        true
    }

    /// Settle an entry whose ticket was dropped without completing.
    fn abandon(&self, key: QueryKey, generation: u64) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(&key) else {
            return;
        };
        if entry.generation != generation || *entry.state.borrow() != Resolution::InFlight {
            return;
        }
        tracing::warn!(%key, generation, "identity check abandoned; treating session as unauthenticated");
        entry.state.send_replace(Resolution::Failed(FailureKind::Aborted));
    }

    /// Reset `key` to `Idle` so the next `begin` issues a fresh attempt.
    pub fn invalidate(&self, key: QueryKey) {
        let mut entries = self.lock();
        let entry = entries.entry(key).or_insert_with(Entry::new);
        entry.generation += 1;
        entry.state.send_replace(Resolution::Idle);
        tracing::debug!(%key, generation = entry.generation, "identity cache invalidated");
    }

    /// Current state of `key`.
    #[must_use]
    pub fn peek(&self, key: QueryKey) -> Resolution {
        self.lock()
            .get(&key)
            .map_or(Resolution::Idle, |entry| entry.state.borrow().clone())
    }

    /// Watch `key` for state changes.
    #[must_use]
    pub fn subscribe(&self, key: QueryKey) -> watch::Receiver<Resolution> {
        self.lock()
            .entry(key)
            .or_insert_with(Entry::new)
            .state
            .subscribe()
    }
}
