//! In-process repository implementation
//!
//! Two row vectors behind a read-write lock, with auto-increment ids. The
//! write paths are the engine's persistence contract; the read paths back
//! the stats projector. Suitable for embedding and tests; a production
//! deployment puts a SQL store behind the same trait.

use crate::stats::{
    ActivityStats, AggregateStats, HealthState, HealthSummary, RecentActivity, TimelineBucket,
    TimelineInterval,
};
use crate::traits::{
    MismatchFilter, Repository, StoreResult, StoredMismatch, ViewFilter,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use crosscheck_core::{Mismatch, PersistedView, ReconStatus, TransactionView};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::warn;

#[derive(Default)]
struct Inner {
    views: Vec<PersistedView>,
    mismatches: Vec<StoredMismatch>,
    next_view_id: i64,
    next_mismatch_id: i64,
}

/// In-memory [`Repository`] guarded by a read-write lock.
#[derive(Default)]
pub struct MemoryRepository {
    inner: RwLock<Inner>,
}

impl MemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn chrono_from_std(d: Duration) -> ChronoDuration {
    ChronoDuration::from_std(d).unwrap_or_else(|_| ChronoDuration::seconds(i64::MAX / 1000))
}

impl Repository for MemoryRepository {
    fn save_view(&self, view: &TransactionView, status: ReconStatus) -> StoreResult<i64> {
        let mut inner = self.inner.write();
        inner.next_view_id += 1;
        let id = inner.next_view_id;
        inner.views.push(PersistedView {
            id,
            view: view.clone(),
            reconciliation_status: status,
            reconciled_at: None,
            reconciled_with_sources: Vec::new(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    fn update_reconciliation(
        &self,
        txn_id: &str,
        status: ReconStatus,
        sources: &[String],
    ) -> StoreResult<usize> {
        let now = Utc::now();
        let mut inner = self.inner.write();
        let mut updated = 0;
        for row in inner.views.iter_mut().filter(|r| r.view.txn_id == txn_id) {
            row.reconciliation_status = status;
            row.reconciled_at = Some(now);
            row.reconciled_with_sources = sources.to_vec();
            updated += 1;
        }
        if updated == 0 {
            // Verdict for views whose arrival rows never made it in
            warn!(
                target: "crosscheck::store",
                txn_id = %txn_id,
                "reconciliation update matched no view rows"
            );
        }
        Ok(updated)
    }

    fn insert_mismatch(&self, mismatch: &Mismatch) -> StoreResult<i64> {
        let mut inner = self.inner.write();
        inner.next_mismatch_id += 1;
        let id = inner.next_mismatch_id;
        inner.mismatches.push(StoredMismatch {
            id,
            mismatch: mismatch.clone(),
        });
        Ok(id)
    }

    fn list_views(&self, filter: &ViewFilter) -> StoreResult<Vec<PersistedView>> {
        let inner = self.inner.read();
        let rows = inner
            .views
            .iter()
            .rev()
            .filter(|r| {
                filter
                    .source
                    .as_deref()
                    .map_or(true, |s| r.view.source == s)
            })
            .filter(|r| {
                filter
                    .status
                    .as_deref()
                    .map_or(true, |s| r.view.status.as_deref() == Some(s))
            })
            .take(if filter.limit == 0 {
                usize::MAX
            } else {
                filter.limit
            })
            .cloned()
            .collect();
        Ok(rows)
    }

    fn list_views_by_txn(&self, txn_id: &str) -> StoreResult<Vec<PersistedView>> {
        let inner = self.inner.read();
        Ok(inner
            .views
            .iter()
            .filter(|r| r.view.txn_id == txn_id)
            .cloned()
            .collect())
    }

    fn list_mismatches(&self, filter: &MismatchFilter) -> StoreResult<Vec<StoredMismatch>> {
        let inner = self.inner.read();
        let rows = inner
            .mismatches
            .iter()
            .rev()
            .filter(|r| {
                filter
                    .severity
                    .map_or(true, |s| r.mismatch.severity() == s)
            })
            .filter(|r| filter.kind.map_or(true, |k| r.mismatch.mismatch_type() == k))
            .filter(|r| filter.state.map_or(true, |s| r.mismatch.state == s))
            .filter(|r| {
                filter
                    .txn_id
                    .as_deref()
                    .map_or(true, |t| r.mismatch.txn_id == t)
            })
            .take(if filter.limit == 0 {
                usize::MAX
            } else {
                filter.limit
            })
            .cloned()
            .collect();
        Ok(rows)
    }

    fn aggregate_stats(&self) -> StoreResult<AggregateStats> {
        let inner = self.inner.read();
        let now = Utc::now();
        let yesterday = now - ChronoDuration::hours(24);

        let mut reconciliation_breakdown: BTreeMap<String, u64> = BTreeMap::new();
        let mut source_distribution: BTreeMap<String, u64> = BTreeMap::new();
        let mut status_distribution: BTreeMap<String, u64> = BTreeMap::new();
        for row in &inner.views {
            *reconciliation_breakdown
                .entry(row.reconciliation_status.to_string())
                .or_insert(0) += 1;
            *source_distribution
                .entry(row.view.source.clone())
                .or_insert(0) += 1;
            let status = row
                .view
                .status
                .clone()
                .unwrap_or_else(|| "UNKNOWN".to_string());
            *status_distribution.entry(status).or_insert(0) += 1;
        }

        let mut mismatch_types: BTreeMap<String, u64> = BTreeMap::new();
        for row in &inner.mismatches {
            *mismatch_types
                .entry(row.mismatch.mismatch_type().to_string())
                .or_insert(0) += 1;
        }

        let matched = *reconciliation_breakdown
            .get(&ReconStatus::Matched.to_string())
            .unwrap_or(&0);
        let mismatched = *reconciliation_breakdown
            .get(&ReconStatus::Mismatch.to_string())
            .unwrap_or(&0);
        let total_reconciled = matched + mismatched;
        let success_rate = if total_reconciled > 0 {
            round1(matched as f64 / total_reconciled as f64 * 100.0)
        } else {
            100.0
        };

        let transactions_24h = inner
            .views
            .iter()
            .filter(|r| r.created_at >= yesterday)
            .count() as u64;
        let mismatches_24h = inner
            .mismatches
            .iter()
            .filter(|r| r.mismatch.detected_at >= yesterday)
            .count() as u64;

        Ok(AggregateStats {
            total_transactions: inner.views.len() as u64,
            total_mismatches: inner.mismatches.len() as u64,
            total_reconciled,
            pending_reconciliation: *reconciliation_breakdown
                .get(&ReconStatus::Pending.to_string())
                .unwrap_or(&0),
            success_rate,
            reconciliation_breakdown,
            source_distribution,
            status_distribution,
            mismatch_types,
            recent_activity: RecentActivity {
                transactions_24h,
                mismatches_24h,
            },
        })
    }

    fn timeline(&self, hours: u32, interval: TimelineInterval) -> StoreResult<Vec<TimelineBucket>> {
        let inner = self.inner.read();
        let end = Utc::now();
        let start = end - ChronoDuration::hours(i64::from(hours));
        let step = chrono_from_std(interval.step());

        let mut buckets = Vec::new();
        let mut current = start;
        while current < end {
            let next = current + step;
            let transactions = inner
                .views
                .iter()
                .filter(|r| r.created_at >= current && r.created_at < next)
                .count() as u64;
            let mismatches = inner
                .mismatches
                .iter()
                .filter(|r| r.mismatch.detected_at >= current && r.mismatch.detected_at < next)
                .count() as u64;
            buckets.push(TimelineBucket {
                bucket_label: interval.label(current),
                timestamp: current,
                transactions,
                mismatches,
            });
            current = next;
        }
        Ok(buckets)
    }

    fn recent_activity(&self, minutes: u32) -> StoreResult<ActivityStats> {
        let inner = self.inner.read();
        let cutoff = Utc::now() - ChronoDuration::minutes(i64::from(minutes));
        let total_transactions = inner
            .views
            .iter()
            .filter(|r| r.created_at >= cutoff)
            .count() as u64;
        let total_mismatches = inner
            .mismatches
            .iter()
            .filter(|r| r.mismatch.detected_at >= cutoff)
            .count() as u64;
        let span = f64::from(minutes.max(1));
        Ok(ActivityStats {
            transaction_rate: round1(total_transactions as f64 / span),
            mismatch_rate: round1(total_mismatches as f64 / span),
            total_transactions,
            total_mismatches,
            period_minutes: minutes,
        })
    }

    fn delayed_count(&self, threshold: Duration) -> StoreResult<u64> {
        let inner = self.inner.read();
        let threshold = chrono_from_std(threshold);
        Ok(inner
            .views
            .iter()
            .filter(|r| {
                r.reconciled_at
                    .map_or(false, |at| at - r.created_at > threshold)
            })
            .count() as u64)
    }

    fn duplicate_count(&self) -> StoreResult<u64> {
        let inner = self.inner.read();
        let mut counts: HashMap<(&str, &str), u64> = HashMap::new();
        for row in &inner.views {
            *counts
                .entry((row.view.txn_id.as_str(), row.view.source.as_str()))
                .or_insert(0) += 1;
        }
        Ok(counts.values().filter(|&&n| n > 1).count() as u64)
    }

    fn health(&self) -> StoreResult<HealthSummary> {
        let inner = self.inner.read();
        let hour_ago = Utc::now() - ChronoDuration::hours(1);
        let transactions_last_hour = inner
            .views
            .iter()
            .filter(|r| r.created_at >= hour_ago)
            .count() as u64;
        let total_transactions = inner.views.len() as u64;
        let last_transaction: Option<DateTime<Utc>> =
            inner.views.iter().map(|r| r.created_at).max();

        let status = if transactions_last_hour > 0 {
            HealthState::Healthy
        } else if total_transactions > 0 {
            HealthState::Idle
        } else {
            HealthState::Waiting
        };

        Ok(HealthSummary {
            status,
            last_transaction,
            transactions_last_hour,
            total_transactions,
        })
    }
}
