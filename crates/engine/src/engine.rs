//! The reconciliation engine
//!
//! Views arrive concurrently from the ingestion workers. Each accepted view
//! is written through to the repository as PENDING, mirrored into the
//! coordination cache, and staged into the in-process group for its
//! transaction id. When a group holds two or more distinct sources the
//! engine claims the single-flight lock, runs the comparison rules over a
//! snapshot of the group, persists the verdict and its mismatches, updates
//! the live counters, and evicts the staged mirror.
//!
//! The in-flight map is the only state guarded by the process-local mutex,
//! and its critical sections are short: read-modify-write of one group.
//! Comparison and persistence run outside it, serialised per transaction id
//! by the distributed lock.

use crate::compare::{detect_mismatches, RuleSettings};
use crate::config::ReconConfig;
use crate::flight::{FlightGuard, FlightTable};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use crosscheck_cache::{keys, CoordinationCache, StagedView};
use crosscheck_core::{
    MismatchType, ReconStatus, TransactionView, Verdict, VerdictStatus, ViewError,
};
use crosscheck_store::Repository;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced to a `submit` caller.
///
/// Everything else the engine encounters (cache transport failures, lock
/// contention, durable write failures) is recovered or logged internally.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The view fails structural validation and cannot be grouped.
    #[error("invalid view: {0}")]
    InvalidView(#[from] ViewError),
}

/// Snapshot of the engine's live counters.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    /// Verdicts written since the engine started.
    pub total_reconciled: u64,
    /// Verdicts that matched cleanly.
    pub matched_verdicts: u64,
    /// Verdicts carrying at least one mismatch.
    pub mismatched_verdicts: u64,
    /// Individual mismatch records emitted.
    pub total_mismatches: u64,
    /// Groups staged in this process that have no verdict yet.
    pub pending_reconciliation: u64,
    /// matched / (matched + mismatched) * 100, or 100.0 before the first
    /// verdict. Rounded to one decimal.
    pub success_rate: f64,
    /// Mismatch record counts per type.
    pub mismatch_types: BTreeMap<String, u64>,
    /// Staged view counts per source, over the in-flight map.
    pub source_counts: BTreeMap<String, u64>,
}

struct Staged {
    view: TransactionView,
    staged_at: DateTime<Utc>,
}

enum GroupState {
    Staged,
    Reconciling,
    Reconciled {
        status: VerdictStatus,
        sources: BTreeSet<String>,
        /// Group generation the verdict judged; a later generation means
        /// new material arrived since.
        generation: u64,
    },
}

struct Group {
    views: BTreeMap<String, Staged>,
    state: GroupState,
    /// Bumped whenever a staged view is added or replaced with different
    /// content. Identical duplicates leave it untouched.
    generation: u64,
}

impl Group {
    fn new() -> Self {
        Self {
            views: BTreeMap::new(),
            state: GroupState::Staged,
            generation: 0,
        }
    }

    /// Drop staged entries past the stage TTL. Returns false when the group
    /// has emptied out and should be removed entirely.
    fn prune(&mut self, now: DateTime<Utc>, ttl: ChronoDuration) -> bool {
        self.views.retain(|_, staged| now - staged.staged_at <= ttl);
        !self.views.is_empty()
    }
}

enum Attempt {
    /// Nothing to do yet, or a duplicate that changes nothing.
    No,
    /// First quorum, or a source the prior verdict has not seen.
    Fresh,
    /// A repeat check on an already-reconciled group; throttle applies.
    Repeat,
}

/// The reconciliation engine. One instance per process; pass the handle
/// explicitly rather than holding it in a global.
pub struct ReconEngine {
    cache: Arc<dyn CoordinationCache>,
    repo: Arc<dyn Repository>,
    config: ReconConfig,
    inflight: Mutex<HashMap<String, Group>>,
    flights: Arc<FlightTable>,
    recent: Mutex<VecDeque<Verdict>>,
    total_reconciled: AtomicU64,
    mismatched_verdicts: AtomicU64,
    total_mismatches: AtomicU64,
    mismatch_type_counts: Mutex<BTreeMap<MismatchType, u64>>,
}

impl ReconEngine {
    /// Create an engine over the given cache and repository.
    pub fn new(
        cache: Arc<dyn CoordinationCache>,
        repo: Arc<dyn Repository>,
        config: ReconConfig,
    ) -> Self {
        Self {
            cache,
            repo,
            config,
            inflight: Mutex::new(HashMap::new()),
            flights: Arc::new(FlightTable::new()),
            recent: Mutex::new(VecDeque::new()),
            total_reconciled: AtomicU64::new(0),
            mismatched_verdicts: AtomicU64::new(0),
            total_mismatches: AtomicU64::new(0),
            mismatch_type_counts: Mutex::new(BTreeMap::new()),
        }
    }

    /// The configuration this engine runs with.
    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// Accept a view for grouping and an eventual verdict.
    ///
    /// Returns promptly: the caller blocks only for the in-flight map's
    /// mutex plus, when this view completes a quorum, the compare-and-persist
    /// window for its own transaction id. No caller waits on another
    /// transaction id.
    pub fn submit(&self, view: TransactionView) -> Result<(), EngineError> {
        view.validate()?;
        let txn_id = view.txn_id.clone();
        let source = view.source.clone();

        if !self.config.sources.iter().any(|s| s == &source) {
            debug!(
                target: "crosscheck::engine",
                txn_id = %txn_id,
                source = %source,
                "view from a source outside the configured set"
            );
        }

        // Durable arrival record, best effort: grouping proceeds even when
        // the repository is down
        if let Err(e) = self.repo.save_view(&view, ReconStatus::Pending) {
            warn!(
                target: "crosscheck::engine",
                txn_id = %txn_id,
                source = %source,
                error = %e,
                "failed to persist arriving view"
            );
        }

        self.stage_in_cache(&view);

        let attempt = self.stage_locally(view);
        match attempt {
            Attempt::No => {}
            Attempt::Fresh => self.attempt_reconcile(&txn_id, false),
            Attempt::Repeat => self.attempt_reconcile(&txn_id, true),
        }
        Ok(())
    }

    /// Snapshot of the live counters.
    pub fn statistics(&self) -> EngineStats {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(self.config.stage_ttl())
            .unwrap_or_else(|_| ChronoDuration::seconds(300));

        let mut pending = 0u64;
        let mut source_counts: BTreeMap<String, u64> = BTreeMap::new();
        {
            let mut inflight = self.inflight.lock();
            inflight.retain(|_, group| group.prune(now, ttl));
            for group in inflight.values() {
                if !matches!(group.state, GroupState::Reconciled { .. }) {
                    pending += 1;
                }
                for source in group.views.keys() {
                    *source_counts.entry(source.clone()).or_insert(0) += 1;
                }
            }
        }

        let total = self.total_reconciled.load(Ordering::Relaxed);
        let mismatched = self.mismatched_verdicts.load(Ordering::Relaxed);
        // The two counters are advanced separately; a concurrent verdict can
        // land between the loads
        let matched = total.saturating_sub(mismatched);
        let success_rate = if total > 0 {
            ((matched as f64 / total as f64 * 100.0) * 10.0).round() / 10.0
        } else {
            100.0
        };

        let mismatch_types = self
            .mismatch_type_counts
            .lock()
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();

        EngineStats {
            total_reconciled: total,
            matched_verdicts: matched,
            mismatched_verdicts: mismatched,
            total_mismatches: self.total_mismatches.load(Ordering::Relaxed),
            pending_reconciliation: pending,
            success_rate,
            mismatch_types,
            source_counts,
        }
    }

    /// The last `limit` verdicts, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<Verdict> {
        let recent = self.recent.lock();
        let skip = recent.len().saturating_sub(limit);
        recent.iter().skip(skip).cloned().collect()
    }

    /// Mirror the view into the coordination cache so another instance can
    /// pick the group up. Every call is best effort.
    fn stage_in_cache(&self, view: &TransactionView) {
        let staged = StagedView::new(view.clone());
        let payload = match staged.to_json() {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    target: "crosscheck::engine",
                    txn_id = %view.txn_id,
                    error = %e,
                    "failed to serialise staged view"
                );
                return;
            }
        };
        let ttl = self.config.stage_ttl();
        if let Err(e) = self
            .cache
            .set_with_ttl(&keys::stage(&view.txn_id), &payload, ttl)
        {
            debug!(
                target: "crosscheck::engine",
                txn_id = %view.txn_id,
                error = %e,
                "staging mirror unavailable"
            );
            return;
        }
        let source_key = keys::stage_source(&view.source);
        if let Err(e) = self
            .cache
            .set_add(&source_key, &view.txn_id)
            .and_then(|()| self.cache.expire(&source_key, ttl))
        {
            debug!(
                target: "crosscheck::engine",
                txn_id = %view.txn_id,
                error = %e,
                "staging reverse index unavailable"
            );
        }
    }

    /// Stage the view into the in-process group and decide whether this
    /// arrival triggers a reconciliation attempt.
    fn stage_locally(&self, view: TransactionView) -> Attempt {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(self.config.stage_ttl())
            .unwrap_or_else(|_| ChronoDuration::seconds(300));
        let txn_id = view.txn_id.clone();
        let source = view.source.clone();

        let mut inflight = self.inflight.lock();
        let group = inflight.entry(txn_id.clone()).or_insert_with(Group::new);
        if !group.prune(now, ttl) {
            // Everything aged out; this arrival starts the group over
            group.state = GroupState::Staged;
        }

        let mut changed = true;
        if let Some(existing) = group.views.get(&source) {
            if existing.view == view {
                changed = false;
            } else {
                warn!(
                    target: "crosscheck::engine",
                    txn_id = %txn_id,
                    source = %source,
                    "source resubmitted with different payload, overwriting staged view"
                );
            }
        } else {
            info!(
                target: "crosscheck::engine",
                txn_id = %txn_id,
                source = %source,
                staged_sources = group.views.len() + 1,
                "view staged"
            );
        }
        group.views.insert(
            source.clone(),
            Staged {
                view,
                staged_at: now,
            },
        );
        if changed {
            group.generation += 1;
        }

        match &group.state {
            GroupState::Staged | GroupState::Reconciling => {
                if group.views.len() >= 2 {
                    Attempt::Fresh
                } else {
                    Attempt::No
                }
            }
            GroupState::Reconciled { sources, .. } => {
                if !sources.contains(&source) {
                    Attempt::Fresh
                } else if changed {
                    Attempt::Repeat
                } else {
                    Attempt::No
                }
            }
        }
    }

    /// Claim the single-flight lock and, if won, compare and persist.
    ///
    /// `throttled` marks repeat checks; those are skipped when another
    /// attempt for the same transaction id began inside the throttle window.
    fn attempt_reconcile(&self, txn_id: &str, throttled: bool) {
        let attempt_count = match self.cache.incr(&keys::throttle(txn_id)) {
            Ok(count) => {
                if count == 1 {
                    let _ = self
                        .cache
                        .expire(&keys::throttle(txn_id), self.config.throttle_ttl());
                }
                count
            }
            Err(_) => 1,
        };
        if throttled && attempt_count > 1 {
            debug!(
                target: "crosscheck::engine",
                txn_id = %txn_id,
                attempt_count,
                "repeat check throttled"
            );
            return;
        }

        let Some(_guard) = FlightGuard::acquire(
            Arc::clone(&self.cache),
            Arc::clone(&self.flights),
            txn_id,
            self.config.lock_ttl(),
        ) else {
            return;
        };

        let now = Utc::now();
        let ttl = ChronoDuration::from_std(self.config.stage_ttl())
            .unwrap_or_else(|_| ChronoDuration::seconds(300));

        // Snapshot the group under the mutex; compare outside it
        let (views, judged_generation): (BTreeMap<String, TransactionView>, u64) = {
            let mut inflight = self.inflight.lock();
            let Some(group) = inflight.get_mut(txn_id) else {
                return;
            };
            if !group.prune(now, ttl) {
                inflight.remove(txn_id);
                return;
            }
            if group.views.len() < 2 {
                return;
            }
            // A competing trigger may have produced the verdict for this
            // exact material while we waited for the lock
            if let GroupState::Reconciled { generation, .. } = group.state {
                if generation == group.generation {
                    return;
                }
            }
            group.state = GroupState::Reconciling;
            let snapshot = group
                .views
                .iter()
                .map(|(name, staged)| (name.clone(), staged.view.clone()))
                .collect();
            (snapshot, group.generation)
        };

        let settings = RuleSettings {
            amount_tolerance: self.config.amount_tolerance,
            time_tolerance_seconds: self.config.time_tolerance_seconds as i64,
            home_currency: &self.config.home_currency,
        };
        let mismatches = detect_mismatches(txn_id, &views, &settings, now);
        let sources: Vec<String> = views.keys().cloned().collect();
        let status = if mismatches.is_empty() {
            VerdictStatus::Matched
        } else {
            VerdictStatus::Mismatch
        };
        let verdict = Verdict {
            txn_id: txn_id.to_string(),
            sources: sources.clone(),
            status,
            decided_at: now,
            mismatches,
        };

        self.persist_verdict(&verdict);
        self.record_verdict(&verdict);
        self.evict_staging(txn_id, &sources);

        {
            let mut inflight = self.inflight.lock();
            if let Some(group) = inflight.get_mut(txn_id) {
                group.state = GroupState::Reconciled {
                    status,
                    sources: sources.iter().cloned().collect(),
                    generation: judged_generation,
                };
            }
        }

        info!(
            target: "crosscheck::engine",
            txn_id = %txn_id,
            status = %status,
            sources = ?sources,
            mismatches = verdict.mismatches.len(),
            "reconciliation complete"
        );
    }

    /// Write the verdict through to the repository. Durable failures are
    /// logged with the transaction id; the in-memory verdict stands and
    /// retry is left to operators.
    fn persist_verdict(&self, verdict: &Verdict) {
        let status = match verdict.status {
            VerdictStatus::Matched => ReconStatus::Matched,
            VerdictStatus::Mismatch => ReconStatus::Mismatch,
        };
        if let Err(e) = self
            .repo
            .update_reconciliation(&verdict.txn_id, status, &verdict.sources)
        {
            warn!(
                target: "crosscheck::engine",
                txn_id = %verdict.txn_id,
                error = %e,
                "failed to persist verdict"
            );
        }
        for mismatch in &verdict.mismatches {
            if let Err(e) = self.repo.insert_mismatch(mismatch) {
                warn!(
                    target: "crosscheck::engine",
                    txn_id = %verdict.txn_id,
                    kind = %mismatch.mismatch_type(),
                    error = %e,
                    "failed to persist mismatch"
                );
            }
        }
    }

    /// Advance the live counters and the recent ring.
    fn record_verdict(&self, verdict: &Verdict) {
        self.total_reconciled.fetch_add(1, Ordering::Relaxed);
        if verdict.status == VerdictStatus::Mismatch {
            self.mismatched_verdicts.fetch_add(1, Ordering::Relaxed);
        }
        self.total_mismatches
            .fetch_add(verdict.mismatches.len() as u64, Ordering::Relaxed);
        {
            let mut counts = self.mismatch_type_counts.lock();
            for mismatch in &verdict.mismatches {
                *counts.entry(mismatch.mismatch_type()).or_insert(0) += 1;
            }
        }
        let mut recent = self.recent.lock();
        recent.push_back(verdict.clone());
        while recent.len() > self.config.recent_limit {
            recent.pop_front();
        }
    }

    /// Remove the staged mirror for a reconciled group. Best effort; the
    /// TTLs clean up whatever this misses.
    fn evict_staging(&self, txn_id: &str, sources: &[String]) {
        if let Err(e) = self.cache.delete(&keys::stage(txn_id)) {
            debug!(
                target: "crosscheck::engine",
                txn_id = %txn_id,
                error = %e,
                "failed to evict staged view"
            );
        }
        for source in sources {
            if let Err(e) = self.cache.set_remove(&keys::stage_source(source), txn_id) {
                debug!(
                    target: "crosscheck::engine",
                    txn_id = %txn_id,
                    source = %source,
                    error = %e,
                    "failed to evict staging reverse index entry"
                );
            }
        }
    }
}
