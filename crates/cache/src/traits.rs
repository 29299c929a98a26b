//! The coordination cache interface

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors a cache backend can report.
///
/// Transport and timeout failures are expected operational events; callers on
/// the engine's decision path degrade to an in-process fallback rather than
/// surfacing them.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not be reached or the connection broke mid-call.
    #[error("cache transport failure: {0}")]
    Transport(String),

    /// The call did not complete within the configured cache timeout.
    #[error("cache call timed out after {0:?}")]
    Timeout(Duration),

    /// The stored value is not usable for the requested operation, for
    /// example `incr` on a non-numeric value or a set operation on a string.
    #[error("wrong value type for key {key}: {detail}")]
    WrongType {
        /// Key the operation was applied to.
        key: String,
        /// What was found versus what was required.
        detail: String,
    },

    /// A value failed to serialise or deserialise.
    #[error("cache serialization error: {0}")]
    Serialization(String),
}

/// Operability snapshot of a cache backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInfo {
    /// Number of live (unexpired) keys.
    pub keys: u64,
    /// Reads that found a live value.
    pub hits: u64,
    /// Reads that found nothing, or only an expired entry.
    pub misses: u64,
    /// Seconds since the backend was created or connected.
    pub uptime_seconds: u64,
}

/// Keyed TTL store used for staging, locking, throttling, and read caching.
///
/// Every key carries a TTL. Implementations must return within the
/// deployment's cache timeout or report [`CacheError::Timeout`] /
/// [`CacheError::Transport`]; they must never block indefinitely.
pub trait CoordinationCache: Send + Sync {
    /// Store `value` under `key`, replacing any prior value, expiring after
    /// `ttl`.
    fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Fetch the live value under `key`, if any.
    fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> CacheResult<()>;

    /// Atomically store `value` under `key` only if the key is absent.
    /// Returns `true` when this call created the key. The basis of the
    /// single-flight reconciliation lock.
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool>;

    /// Increment the counter under `key`, creating it at 1 if absent.
    /// Returns the post-increment value.
    fn incr(&self, key: &str) -> CacheResult<i64>;

    /// Reset the TTL of an existing key. A no-op if the key is absent.
    fn expire(&self, key: &str, ttl: Duration) -> CacheResult<()>;

    /// Add `member` to the set under `key`, creating the set if absent.
    fn set_add(&self, key: &str, member: &str) -> CacheResult<()>;

    /// Members of the set under `key`, in lexicographic order. Empty if the
    /// key is absent.
    fn set_members(&self, key: &str) -> CacheResult<Vec<String>>;

    /// Remove `member` from the set under `key`. A no-op if absent.
    fn set_remove(&self, key: &str, member: &str) -> CacheResult<()>;

    /// Operability snapshot for health reporting.
    fn info(&self) -> CacheResult<CacheInfo>;
}
