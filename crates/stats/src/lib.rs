//! Stats projection for the Crosscheck reconciliation engine
//!
//! A pure read path: every metric is derived from the repository, with the
//! coordination cache consulted first to keep dashboard refreshes off the
//! durable store. The cache is an optimisation, never the truth; any cache
//! failure falls through to the repository silently.

use crosscheck_cache::{check_rate_limit, keys, CoordinationCache};
use crosscheck_store::{
    ActivityStats, AggregateStats, HealthSummary, Repository, StoreResult, TimelineBucket,
    TimelineInterval,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Cache slot name for the aggregate stats payload.
const STATS_NAME: &str = "transaction_stats";

/// Derives dashboard metrics from the repository, cache first.
pub struct StatsProjector {
    cache: Arc<dyn CoordinationCache>,
    repo: Arc<dyn Repository>,
    stats_ttl: Duration,
    api_ttl: Duration,
}

impl StatsProjector {
    /// Create a projector with the given cache lifetimes.
    pub fn new(
        cache: Arc<dyn CoordinationCache>,
        repo: Arc<dyn Repository>,
        stats_ttl: Duration,
        api_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            repo,
            stats_ttl,
            api_ttl,
        }
    }

    /// The aggregate metric set, cached under `stats:transaction_stats`.
    pub fn stats(&self) -> StoreResult<AggregateStats> {
        let key = keys::stats(STATS_NAME);
        if let Some(cached) = self.cached::<AggregateStats>(&key) {
            return Ok(cached);
        }
        let stats = self.repo.aggregate_stats()?;
        self.store(&key, &stats, self.stats_ttl);
        Ok(stats)
    }

    /// Activity timeline buckets, cached per `(hours, interval)` request.
    pub fn timeline(
        &self,
        hours: u32,
        interval: TimelineInterval,
    ) -> StoreResult<Vec<TimelineBucket>> {
        let key = keys::api_cache(
            "timeline",
            &json!({"hours": hours, "interval": interval.to_string()}),
        );
        if let Some(cached) = self.cached::<Vec<TimelineBucket>>(&key) {
            return Ok(cached);
        }
        let buckets = self.repo.timeline(hours, interval)?;
        self.store(&key, &buckets, self.api_ttl);
        Ok(buckets)
    }

    /// Per-minute activity rates over the trailing window. Uncached; the
    /// window is meant to be read live.
    pub fn recent_activity(&self, minutes: u32) -> StoreResult<ActivityStats> {
        self.repo.recent_activity(minutes)
    }

    /// Verdicts that took longer than `threshold` after arrival.
    pub fn delayed_count(&self, threshold: Duration) -> StoreResult<u64> {
        self.repo.delayed_count(threshold)
    }

    /// `(txn_id, source)` tuples recorded more than once.
    pub fn duplicate_count(&self) -> StoreResult<u64> {
        self.repo.duplicate_count()
    }

    /// Repository health summary.
    pub fn health(&self) -> StoreResult<HealthSummary> {
        self.repo.health()
    }

    /// Fixed-window rate limit for a read-surface caller. Fails open: a
    /// cache failure allows the call.
    pub fn check_rate_limit(&self, identifier: &str, limit: i64) -> bool {
        check_rate_limit(self.cache.as_ref(), identifier, limit, keys::RATE_TTL).unwrap_or(true)
    }

    fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!(target: "crosscheck::stats", key = %key, error = %e, "discarding unreadable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!(target: "crosscheck::stats", key = %key, error = %e, "cache read failed, falling through");
                None
            }
        }
    }

    fn store<T: serde::Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let payload = match serde_json::to_string(value) {
            Ok(p) => p,
            Err(_) => return,
        };
        if let Err(e) = self.cache.set_with_ttl(key, &payload, ttl) {
            debug!(target: "crosscheck::stats", key = %key, error = %e, "cache write failed");
        }
    }
}
