//! Cache failures must never reach the decision path.

use crosscheck::{
    CacheError, CacheInfo, CacheResult, CoordinationCache, MemoryRepository, ReconConfig,
    ReconEngine, Repository, StatsProjector, TransactionView, VerdictStatus,
};
use std::sync::Arc;
use std::time::Duration;

/// A coordination cache whose every call fails at the transport level.
struct DownCache;

impl CoordinationCache for DownCache {
    fn set_with_ttl(&self, _: &str, _: &str, _: Duration) -> CacheResult<()> {
        Err(CacheError::Transport("connection refused".into()))
    }
    fn get(&self, _: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Transport("connection refused".into()))
    }
    fn delete(&self, _: &str) -> CacheResult<()> {
        Err(CacheError::Transport("connection refused".into()))
    }
    fn set_if_absent(&self, _: &str, _: &str, _: Duration) -> CacheResult<bool> {
        Err(CacheError::Transport("connection refused".into()))
    }
    fn incr(&self, _: &str) -> CacheResult<i64> {
        Err(CacheError::Transport("connection refused".into()))
    }
    fn expire(&self, _: &str, _: Duration) -> CacheResult<()> {
        Err(CacheError::Transport("connection refused".into()))
    }
    fn set_add(&self, _: &str, _: &str) -> CacheResult<()> {
        Err(CacheError::Transport("connection refused".into()))
    }
    fn set_members(&self, _: &str) -> CacheResult<Vec<String>> {
        Err(CacheError::Transport("connection refused".into()))
    }
    fn set_remove(&self, _: &str, _: &str) -> CacheResult<()> {
        Err(CacheError::Transport("connection refused".into()))
    }
    fn info(&self) -> CacheResult<CacheInfo> {
        Err(CacheError::Transport("connection refused".into()))
    }
}

fn view(json: &str) -> TransactionView {
    serde_json::from_str(json).unwrap()
}

#[test]
fn verdicts_survive_a_dead_cache() {
    let repo = Arc::new(MemoryRepository::new());
    let engine = ReconEngine::new(
        Arc::new(DownCache) as Arc<dyn CoordinationCache>,
        Arc::clone(&repo) as Arc<dyn Repository>,
        ReconConfig::default(),
    );

    engine
        .submit(view(
            r#"{"txn_id":"T1","source":"core","amount":10.0,"status":"SUCCESS"}"#,
        ))
        .unwrap();
    engine
        .submit(view(
            r#"{"txn_id":"T1","source":"gateway","amount":20.0,"status":"SUCCESS"}"#,
        ))
        .unwrap();

    let recent = engine.recent(10);
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].status, VerdictStatus::Mismatch);

    // The repository still saw everything
    let rows = repo.list_views_by_txn("T1").unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .all(|r| r.reconciliation_status == crosscheck::ReconStatus::Mismatch));
}

#[test]
fn local_lock_table_still_serialises_per_txn() {
    use std::thread;

    let repo = Arc::new(MemoryRepository::new());
    let engine = Arc::new(ReconEngine::new(
        Arc::new(DownCache) as Arc<dyn CoordinationCache>,
        Arc::clone(&repo) as Arc<dyn Repository>,
        ReconConfig::default(),
    ));

    let txns = 30usize;
    let mut handles = Vec::new();
    for source in ["core", "gateway"] {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for i in 0..txns {
                let payload = format!(
                    r#"{{"txn_id":"T{i}","source":"{source}","amount":5.0,"status":"SUCCESS"}}"#
                );
                engine.submit(serde_json::from_str(&payload).unwrap()).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.statistics().total_reconciled, txns as u64);
}

#[test]
fn projector_falls_through_to_the_repository() {
    let repo = Arc::new(MemoryRepository::new());
    let seeded: TransactionView =
        view(r#"{"txn_id":"T1","source":"core","amount":10.0,"status":"SUCCESS"}"#);
    repo.save_view(&seeded, crosscheck::ReconStatus::Pending)
        .unwrap();

    let projector = StatsProjector::new(
        Arc::new(DownCache) as Arc<dyn CoordinationCache>,
        Arc::clone(&repo) as Arc<dyn Repository>,
        Duration::from_secs(120),
        Duration::from_secs(30),
    );

    assert_eq!(projector.stats().unwrap().total_transactions, 1);
    assert_eq!(
        projector
            .timeline(24, crosscheck::TimelineInterval::Hour)
            .unwrap()
            .len(),
        24
    );
    // Rate limiting fails open when the cache is down
    assert!(projector.check_rate_limit("ops", 1));
    assert!(projector.check_rate_limit("ops", 1));
}
