//! The repository interface

use crate::stats::{
    ActivityStats, AggregateStats, HealthSummary, TimelineBucket, TimelineInterval,
};
use crosscheck_core::{
    Mismatch, MismatchState, MismatchType, PersistedView, ReconStatus, Severity, TransactionView,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for repository operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors a repository backend can report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store rejected or failed the operation.
    #[error("repository backend error: {0}")]
    Backend(String),

    /// A row failed to serialise or deserialise.
    #[error("repository serialization error: {0}")]
    Serialization(String),
}

/// A mismatch with its repository-assigned row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMismatch {
    /// Row id, assigned on insert.
    pub id: i64,
    /// The mismatch as detected. Immutable once inserted.
    pub mismatch: Mismatch,
}

/// Filters for listing views. `None` means no constraint.
#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    /// Maximum rows returned, newest first. Zero means no limit.
    pub limit: usize,
    /// Restrict to one source.
    pub source: Option<String>,
    /// Restrict to one reported transaction status (case-insensitive).
    pub status: Option<String>,
}

/// Filters for listing mismatches. `None` means no constraint.
#[derive(Debug, Clone, Default)]
pub struct MismatchFilter {
    /// Maximum rows returned, newest first. Zero means no limit.
    pub limit: usize,
    /// Restrict to one severity.
    pub severity: Option<Severity>,
    /// Restrict to one mismatch type.
    pub kind: Option<MismatchType>,
    /// Restrict to one lifecycle state.
    pub state: Option<MismatchState>,
    /// Restrict to one transaction id.
    pub txn_id: Option<String>,
}

/// Durable write-through of views, verdicts, and mismatches, plus the read
/// queries behind the stats surfaces. Any SQL or document store satisfies
/// this; consistency with the coordination cache is eventual.
pub trait Repository: Send + Sync {
    /// Record a view row in the given reconciliation state. Returns the row
    /// id.
    fn save_view(&self, view: &TransactionView, status: ReconStatus) -> StoreResult<i64>;

    /// Mark every view row with this transaction id as reconciled. Returns
    /// the number of rows updated.
    fn update_reconciliation(
        &self,
        txn_id: &str,
        status: ReconStatus,
        sources: &[String],
    ) -> StoreResult<usize>;

    /// Append one mismatch row. Rows are immutable once inserted. Returns
    /// the row id.
    fn insert_mismatch(&self, mismatch: &Mismatch) -> StoreResult<i64>;

    /// List view rows, newest first.
    fn list_views(&self, filter: &ViewFilter) -> StoreResult<Vec<PersistedView>>;

    /// Every view row recorded for one transaction id, oldest first.
    fn list_views_by_txn(&self, txn_id: &str) -> StoreResult<Vec<PersistedView>>;

    /// List mismatch rows, newest first.
    fn list_mismatches(&self, filter: &MismatchFilter) -> StoreResult<Vec<StoredMismatch>>;

    /// The aggregate metric set.
    fn aggregate_stats(&self) -> StoreResult<AggregateStats>;

    /// Contiguous activity buckets covering the trailing `hours`, oldest
    /// first. Empty buckets appear with zero counts.
    fn timeline(&self, hours: u32, interval: TimelineInterval) -> StoreResult<Vec<TimelineBucket>>;

    /// Per-minute activity rates over the trailing `minutes`.
    fn recent_activity(&self, minutes: u32) -> StoreResult<ActivityStats>;

    /// Views whose verdict took longer than `threshold` after arrival.
    fn delayed_count(&self, threshold: Duration) -> StoreResult<u64>;

    /// `(txn_id, source)` tuples recorded more than once.
    fn duplicate_count(&self) -> StoreResult<u64>;

    /// Derived health summary.
    fn health(&self) -> StoreResult<HealthSummary>;
}
