//! Staged-view envelope
//!
//! The value stored under `stage:{txn_id}`: the view as submitted plus the
//! instant it was staged, so another instance picking the group up can see
//! its age.

use crate::traits::{CacheError, CacheResult};
use chrono::{DateTime, Utc};
use crosscheck_core::TransactionView;
use serde::{Deserialize, Serialize};

/// Serialised form of an in-flight view in the staging mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedView {
    /// The view as submitted.
    pub view: TransactionView,
    /// Instant the view entered the staging area.
    pub stored_at: DateTime<Utc>,
}

impl StagedView {
    /// Wrap a view, stamping it with the current instant.
    pub fn new(view: TransactionView) -> Self {
        Self {
            view,
            stored_at: Utc::now(),
        }
    }

    /// Serialise for storage under `stage:{txn_id}`.
    pub fn to_json(&self) -> CacheResult<String> {
        serde_json::to_string(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    /// Parse a staged value read back from the cache.
    pub fn from_json(raw: &str) -> CacheResult<Self> {
        serde_json::from_str(raw).map_err(|e| CacheError::Serialization(e.to_string()))
    }
}
