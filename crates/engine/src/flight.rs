//! Single-flight reconciliation locking
//!
//! Before comparing a group the engine claims `lock:{txn_id}` in the
//! coordination cache with an atomic set-if-absent. Holding the key means no
//! other worker, in this process or any other, is reconciling the same
//! transaction id. The TTL bounds the effect of a crashed holder.
//!
//! When the cache is unreachable the claim falls back to a process-local
//! table, preserving mutual exclusion within this instance. The guard
//! releases on drop, so every exit path including panics gives the lock
//! back.

use chrono::Utc;
use crosscheck_cache::{keys, CoordinationCache};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Process-local fallback table of claimed transaction ids.
#[derive(Default)]
pub struct FlightTable {
    claimed: DashMap<String, ()>,
}

impl FlightTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn try_claim(&self, txn_id: &str) -> bool {
        let mut claimed = false;
        self.claimed
            .entry(txn_id.to_string())
            .or_insert_with(|| {
                claimed = true;
            });
        claimed
    }

    fn release(&self, txn_id: &str) {
        self.claimed.remove(txn_id);
    }
}

enum Claim {
    Cache { key: String },
    Local,
}

/// Exclusive right to reconcile one transaction id, released on drop.
pub struct FlightGuard {
    cache: Arc<dyn CoordinationCache>,
    table: Arc<FlightTable>,
    txn_id: String,
    claim: Claim,
}

impl FlightGuard {
    /// Attempt to claim the single-flight lock for `txn_id`.
    ///
    /// Returns `None` when another worker already holds it; the caller
    /// abandons its attempt silently. A cache transport failure degrades to
    /// the process-local table and never surfaces to the caller.
    pub fn acquire(
        cache: Arc<dyn CoordinationCache>,
        table: Arc<FlightTable>,
        txn_id: &str,
        ttl: Duration,
    ) -> Option<Self> {
        let key = keys::lock(txn_id);
        match cache.set_if_absent(&key, &Utc::now().to_rfc3339(), ttl) {
            Ok(true) => Some(Self {
                cache,
                table,
                txn_id: txn_id.to_string(),
                claim: Claim::Cache { key },
            }),
            Ok(false) => {
                debug!(
                    target: "crosscheck::engine",
                    txn_id = %txn_id,
                    "reconciliation already in flight elsewhere"
                );
                None
            }
            Err(e) => {
                warn!(
                    target: "crosscheck::engine",
                    txn_id = %txn_id,
                    error = %e,
                    "cache unreachable for lock, falling back to local table"
                );
                if table.try_claim(txn_id) {
                    Some(Self {
                        cache,
                        table,
                        txn_id: txn_id.to_string(),
                        claim: Claim::Local,
                    })
                } else {
                    debug!(
                        target: "crosscheck::engine",
                        txn_id = %txn_id,
                        "reconciliation already in flight in this process"
                    );
                    None
                }
            }
        }
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        match &self.claim {
            Claim::Cache { key } => {
                if let Err(e) = self.cache.delete(key) {
                    // TTL expiry will reclaim it
                    warn!(
                        target: "crosscheck::engine",
                        txn_id = %self.txn_id,
                        error = %e,
                        "failed to release reconciliation lock"
                    );
                }
            }
            Claim::Local => self.table.release(&self.txn_id),
        }
    }
}
