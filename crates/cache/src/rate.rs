//! Fixed-window rate limiting for read-surface callers

use crate::keys;
use crate::traits::{CacheResult, CoordinationCache};
use std::time::Duration;

/// Check whether `identifier` is still within `limit` calls for the current
/// window. Returns `true` when the call is allowed.
///
/// The first call in a window creates the counter with the window TTL;
/// later calls increment it. Once the counter reaches the limit the caller
/// is refused until the window expires.
pub fn check_rate_limit(
    cache: &dyn CoordinationCache,
    identifier: &str,
    limit: i64,
    window: Duration,
) -> CacheResult<bool> {
    let key = keys::rate(identifier);
    match cache.get(&key)? {
        None => {
            cache.set_with_ttl(&key, "1", window)?;
            Ok(true)
        }
        Some(raw) => {
            let count: i64 = raw.parse().unwrap_or(0);
            if count >= limit {
                return Ok(false);
            }
            cache.incr(&key)?;
            Ok(true)
        }
    }
}
