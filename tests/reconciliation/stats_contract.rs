//! The metric contract the dashboards depend on.

use crate::common::{clean_pair, system, view};
use chrono::Duration as ChronoDuration;
use crosscheck::{HealthState, TimelineInterval};
use std::time::Duration;

/// Mixed workload: one matched, one mismatched, one pending transaction.
fn seeded() -> crosscheck::Crosscheck {
    let system = system();
    let (core, gateway) = clean_pair("T1");
    system.engine().submit(core).unwrap();
    system.engine().submit(gateway).unwrap();

    system.engine().submit(view(
        r#"{"txn_id":"T2","source":"core","amount":10.0,"status":"SUCCESS","currency":"INR"}"#,
    )).unwrap();
    system.engine().submit(view(
        r#"{"txn_id":"T2","source":"mobile","amount":10.0,"status":"FAILED","currency":"INR"}"#,
    )).unwrap();

    system.engine().submit(view(
        r#"{"txn_id":"T3","source":"gateway","amount":42.0,"status":"PENDING"}"#,
    )).unwrap();
    system
}

#[test]
fn aggregate_metrics_line_up() {
    let system = seeded();
    let stats = system.projector().stats().unwrap();

    assert_eq!(stats.total_transactions, 5);
    assert_eq!(stats.total_mismatches, 1);
    assert_eq!(stats.total_reconciled, 4);
    assert_eq!(stats.pending_reconciliation, 1);
    assert_eq!(stats.success_rate, 50.0);
    assert_eq!(stats.reconciliation_breakdown["MATCHED"], 2);
    assert_eq!(stats.reconciliation_breakdown["MISMATCH"], 2);
    assert_eq!(stats.reconciliation_breakdown["PENDING"], 1);
    assert_eq!(stats.source_distribution["core"], 2);
    assert_eq!(stats.source_distribution["gateway"], 2);
    assert_eq!(stats.source_distribution["mobile"], 1);
    assert_eq!(stats.status_distribution["SUCCESS"], 3);
    assert_eq!(stats.mismatch_types["STATUS"], 1);
    assert_eq!(stats.recent_activity.transactions_24h, 5);
    assert_eq!(stats.recent_activity.mismatches_24h, 1);
}

#[test]
fn success_rate_stays_inside_bounds() {
    let empty = system();
    assert_eq!(empty.projector().stats().unwrap().success_rate, 100.0);

    let system = seeded();
    let rate = system.projector().stats().unwrap().success_rate;
    assert!((0.0..=100.0).contains(&rate));
}

#[test]
fn hourly_timeline_covers_the_window_contiguously() {
    let system = seeded();
    let buckets = system
        .projector()
        .timeline(24, TimelineInterval::Hour)
        .unwrap();

    assert_eq!(buckets.len(), 24);
    for pair in buckets.windows(2) {
        assert_eq!(
            pair[1].timestamp - pair[0].timestamp,
            ChronoDuration::hours(1)
        );
    }
    // Empty buckets show zeroes; only the newest bucket carries activity
    for bucket in &buckets[..23] {
        assert_eq!(bucket.transactions, 0);
        assert_eq!(bucket.mismatches, 0);
    }
    assert_eq!(buckets[23].transactions, 5);
    assert_eq!(buckets[23].mismatches, 1);
}

#[test]
fn derived_counts_delayed_and_duplicates() {
    let system = seeded();
    // Verdicts landed within milliseconds of arrival
    assert_eq!(
        system
            .projector()
            .delayed_count(Duration::from_secs(300))
            .unwrap(),
        0
    );
    assert_eq!(system.projector().duplicate_count().unwrap(), 0);

    let (core, _) = clean_pair("T1");
    system.engine().submit(core).unwrap();
    assert_eq!(system.projector().duplicate_count().unwrap(), 1);
}

#[test]
fn health_reflects_write_activity() {
    let empty = system();
    assert_eq!(empty.projector().health().unwrap().status, HealthState::Waiting);

    let system = seeded();
    let health = system.projector().health().unwrap();
    assert_eq!(health.status, HealthState::Healthy);
    assert_eq!(health.total_transactions, 5);
    assert_eq!(health.transactions_last_hour, 5);
    assert!(health.last_transaction.is_some());
}

#[test]
fn engine_statistics_agree_with_the_repository() {
    let system = seeded();
    let engine_stats = system.engine().statistics();
    let repo_stats = system.projector().stats().unwrap();

    assert_eq!(engine_stats.total_reconciled, 2);
    assert_eq!(engine_stats.matched_verdicts, 1);
    assert_eq!(engine_stats.mismatched_verdicts, 1);
    assert_eq!(engine_stats.total_mismatches, repo_stats.total_mismatches);
    assert_eq!(engine_stats.success_rate, repo_stats.success_rate);
    assert_eq!(engine_stats.pending_reconciliation, 1);
    assert_eq!(engine_stats.mismatch_types["STATUS"], 1);
}

#[test]
fn cache_info_reports_operability_counters() {
    use crosscheck::CoordinationCache;

    let system = seeded();
    let _ = system.projector().stats().unwrap();
    let info = system.cache().info().unwrap();
    assert!(info.keys > 0);
    assert!(info.hits + info.misses > 0);
}
