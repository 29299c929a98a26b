//! Key families and default TTLs
//!
//! One builder per key family so prefixes live in exactly one place. The
//! TTLs are the deployment defaults; the engine config can override the ones
//! it owns.

use sha2::{Digest, Sha256};
use std::time::Duration;

/// In-flight staging mirror, 5 minutes.
pub const STAGE_TTL: Duration = Duration::from_secs(300);
/// Single-flight reconciliation lock, 30 seconds.
pub const LOCK_TTL: Duration = Duration::from_secs(30);
/// Back-pressure counter on repeat checks, 5 seconds.
pub const THROTTLE_TTL: Duration = Duration::from_secs(5);
/// Read-side response cache, 30 seconds.
pub const API_CACHE_TTL: Duration = Duration::from_secs(30);
/// Computed statistics cache, 2 minutes.
pub const STATS_TTL: Duration = Duration::from_secs(120);
/// Caller rate-limit window, 1 hour.
pub const RATE_TTL: Duration = Duration::from_secs(3600);

/// `stage:{txn_id}` holds the serialised staged view.
pub fn stage(txn_id: &str) -> String {
    format!("stage:{txn_id}")
}

/// `stage-source:{source}` is the reverse index of staged txn ids per source.
pub fn stage_source(source: &str) -> String {
    format!("stage-source:{source}")
}

/// `lock:{txn_id}` is the single-flight reconciliation lock.
pub fn lock(txn_id: &str) -> String {
    format!("lock:{txn_id}")
}

/// `throttle:{txn_id}` counts reconciliation attempts inside the window.
pub fn throttle(txn_id: &str) -> String {
    format!("throttle:{txn_id}")
}

/// `stats:{name}` caches a computed statistics payload.
pub fn stats(name: &str) -> String {
    format!("stats:{name}")
}

/// `rate:{identifier}` is the fixed-window rate-limit counter.
pub fn rate(identifier: &str) -> String {
    format!("rate:{identifier}")
}

/// `cache:api:{digest}` caches a read-side response, keyed by a digest of the
/// endpoint and its parameters.
///
/// `params` must already be in canonical form; `serde_json::Value` object
/// keys are sorted, which makes the digest stable across callers.
pub fn api_cache(endpoint: &str, params: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(endpoint.as_bytes());
    hasher.update(b":");
    hasher.update(params.to_string().as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("cache:api:{hex}")
}
