//! In-memory cache of impersonation tokens, keyed by subject.
//!
//! Lookups take the read lock; inserts and sweeps take the write lock. Signing
//! never happens while a lock is held (see `ImpersonationService`).
//!
//! Capacity: with `max_entries > 0`, inserting a new subject into a full cache
//! first drops expired entries, then the entry closest to expiry. Overwriting
//! an existing subject never evicts. `max_entries == 0` disables the bound.
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::services::clock::Clock;

/// A signed impersonation token and the instant it stops being usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedCredential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl DerivedCredential {
    /// Usable iff `now` is strictly before the recorded expiry.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

pub struct ImpersonationCache {
    entries: RwLock<HashMap<String, DerivedCredential>>,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ImpersonationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImpersonationCache")
            .field("len", &self.len())
            .field("max_entries", &self.max_entries)
            .finish_non_exhaustive()
    }
}

impl ImpersonationCache {
    pub fn new(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
            clock,
        }
    }

    /// Fresh credential for `subject`, or `None` when absent or expired.
    pub fn get(&self, subject: &str) -> Option<DerivedCredential> {
        let now = self.clock.now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        entries
            .get(subject)
            .filter(|entry| entry.is_fresh(now))
            .cloned()
    }

    /// Store (or replace) the credential for `subject`.
    pub fn put(&self, subject: &str, token: String, expires_at: DateTime<Utc>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if self.max_entries > 0
            && entries.len() >= self.max_entries
            && !entries.contains_key(subject)
        {
            let now = self.clock.now();
            entries.retain(|_, entry| entry.is_fresh(now));

            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(key, _)| key.clone());
                if let Some(key) = oldest {
                    debug!(evicted = %key, "impersonation cache full, evicting");
                    entries.remove(&key);
                }
            }
        }

        entries.insert(
            subject.to_string(),
            DerivedCredential { token, expires_at },
        );
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
