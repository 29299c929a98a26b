//! In-process cache implementation
//!
//! A dashmap keyspace with lazy TTL expiry: entries record their deadline and
//! are dropped by whichever reader or writer touches them past it. There is
//! no reaper thread; the engine's explicit eviction after verdicts keeps the
//! keyspace small, and expired entries that are never touched again cost one
//! map slot until process exit.

use crate::traits::{CacheError, CacheInfo, CacheResult, CoordinationCache};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Stored {
    Text(String),
    Counter(i64),
    Set(BTreeSet<String>),
}

impl Stored {
    fn type_name(&self) -> &'static str {
        match self {
            Stored::Text(_) => "string",
            Stored::Counter(_) => "counter",
            Stored::Set(_) => "set",
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Stored,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline <= now)
    }
}

/// In-memory [`CoordinationCache`] backed by a concurrent map.
///
/// Used when the deployment runs a single process, and by every test. All
/// operations are infallible at the transport level; the error paths of the
/// trait are exercised with failing stubs in the engine's tests.
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    hits: AtomicU64,
    misses: AtomicU64,
    started_at: Instant,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Remove the entry if it has expired; returns true when a live entry
    /// remains.
    fn purge_expired(&self, key: &str) -> bool {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return true;
            }
        } else {
            return false;
        }
        // Re-check under the removal to avoid racing a concurrent refresh
        self.entries
            .remove_if(key, |_, entry| entry.is_expired(now));
        self.entries.contains_key(key)
    }

    fn wrong_type(key: &str, found: &Stored, wanted: &str) -> CacheError {
        CacheError::WrongType {
            key: key.to_string(),
            detail: format!("found {}, need {}", found.type_name(), wanted),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinationCache for MemoryCache {
    fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Stored::Text(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        if !self.purge_expired(key) {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Stored::Text(s) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Ok(Some(s.clone()))
                }
                Stored::Counter(n) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Ok(Some(n.to_string()))
                }
                other => Err(Self::wrong_type(key, other, "string")),
            },
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        self.purge_expired(key);
        let now = Instant::now();
        let mut created = false;
        self.entries
            .entry(key.to_string())
            .and_modify(|entry| {
                // A concurrent purge can leave an expired entry; claim it
                if entry.is_expired(now) {
                    entry.value = Stored::Text(value.to_string());
                    entry.expires_at = Some(now + ttl);
                    created = true;
                }
            })
            .or_insert_with(|| {
                created = true;
                Entry {
                    value: Stored::Text(value.to_string()),
                    expires_at: Some(now + ttl),
                }
            });
        Ok(created)
    }

    fn incr(&self, key: &str) -> CacheResult<i64> {
        self.purge_expired(key);
        let mut entry = self.entries.entry(key.to_string()).or_insert(Entry {
            value: Stored::Counter(0),
            expires_at: None,
        });
        let next = match &entry.value {
            Stored::Counter(n) => n + 1,
            // Numeric strings behave as counters, as in Redis
            Stored::Text(s) => match s.parse::<i64>() {
                Ok(n) => n + 1,
                Err(_) => return Err(Self::wrong_type(key, &entry.value, "counter")),
            },
            other => return Err(Self::wrong_type(key, other, "counter")),
        };
        entry.value = Stored::Counter(next);
        Ok(next)
    }

    fn expire(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        if !self.purge_expired(key) {
            return Ok(());
        }
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    fn set_add(&self, key: &str, member: &str) -> CacheResult<()> {
        self.purge_expired(key);
        let mut entry = self.entries.entry(key.to_string()).or_insert(Entry {
            value: Stored::Set(BTreeSet::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Stored::Set(members) => {
                members.insert(member.to_string());
                Ok(())
            }
            other => Err(Self::wrong_type(key, other, "set")),
        }
    }

    fn set_members(&self, key: &str) -> CacheResult<Vec<String>> {
        if !self.purge_expired(key) {
            return Ok(Vec::new());
        }
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Stored::Set(members) => Ok(members.iter().cloned().collect()),
                other => Err(Self::wrong_type(key, other, "set")),
            },
            None => Ok(Vec::new()),
        }
    }

    fn set_remove(&self, key: &str, member: &str) -> CacheResult<()> {
        if !self.purge_expired(key) {
            return Ok(());
        }
        if let Some(mut entry) = self.entries.get_mut(key) {
            if let Stored::Set(members) = &mut entry.value {
                members.remove(member);
            }
        }
        Ok(())
    }

    fn info(&self) -> CacheResult<CacheInfo> {
        let now = Instant::now();
        let keys = self
            .entries
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .count() as u64;
        Ok(CacheInfo {
            keys,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            uptime_seconds: self.started_at.elapsed().as_secs(),
        })
    }
}
