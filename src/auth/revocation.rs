//! Token revocation cache.
//!
//! Revoked tokens are tracked by key (the `jti` claim, else the raw token) until
//! the token's own expiry. After that the signature check alone rejects the token,
//! so the entry is dead weight and may be dropped.
//!
//! # Consistency
//! `InMemoryRevocationStore` is only authoritative for a single gateway process.
//! Deployments with several instances need a `RevocationStore` backed by a shared
//! cache with server-side TTLs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time;

use crate::auth::clock::Clock;
use crate::observability::metrics;

/// Storage for revoked token keys.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Mark `key` revoked until `expires_at` (unix seconds).
    ///
    /// Idempotent: revoking a live entry again leaves its expiry untouched.
    async fn revoke(&self, key: &str, expires_at: u64);

    /// True iff `key` has a live entry (`now <= expires_at`).
    async fn is_revoked(&self, key: &str) -> bool;

    /// Remove every expired entry, returning how many were removed.
    async fn sweep_expired(&self) -> usize;

    /// Number of entries currently held, expired or not.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local revocation store over a concurrent map.
#[derive(Debug, Clone)]
pub struct InMemoryRevocationStore {
    entries: Arc<DashMap<String, u64>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRevocationStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            clock,
        }
    }

    /// The stored expiry for `key`, live or not.
    pub fn expiry_of(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|r| *r.value())
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, key: &str, expires_at: u64) {
        let now = self.clock.now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                // A stale entry that was never swept is replaced, a live one is kept.
                if *occupied.get() < now {
                    occupied.insert(expires_at);
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(expires_at);
            }
        }
        metrics::record_revocation(self.entries.len());
    }

    async fn is_revoked(&self, key: &str) -> bool {
        let now = self.clock.now();
        let expires_at = match self.entries.get(key) {
            Some(entry) => *entry.value(),
            None => return false,
        };
        if now <= expires_at {
            return true;
        }
        // Re-checked under the shard lock so a concurrent re-revoke survives.
        self.entries.remove_if(key, |_, exp| *exp < now);
        false
    }

    async fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, exp| *exp >= now);
        let removed = before.saturating_sub(self.entries.len());
        metrics::record_revocation_sweep(removed, self.entries.len());
        removed
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Background task that periodically removes expired revocation entries.
pub struct RevocationSweeper {
    store: Arc<dyn RevocationStore>,
    interval: Duration,
}

impl RevocationSweeper {
    pub fn new(store: Arc<dyn RevocationStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Revocation sweeper starting");

        let mut ticker = time::interval(self.interval);
        // The first tick completes immediately; nothing to sweep yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.store.sweep_expired().await;
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.store.len(), "Swept expired revocations");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Revocation sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
