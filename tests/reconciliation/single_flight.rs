//! Keyed mutual exclusion: one verdict per group, locks released on every
//! path, independent transaction ids in parallel.

use crate::common::{clean_pair, system};
use crosscheck::Repository;
use std::sync::Arc;
use std::thread;

#[test]
fn lock_key_is_released_after_the_verdict() {
    use crosscheck::CoordinationCache;

    let system = system();
    let (core, gateway) = clean_pair("T1");
    system.engine().submit(core).unwrap();
    system.engine().submit(gateway).unwrap();

    assert_eq!(system.engine().statistics().total_reconciled, 1);
    assert_eq!(system.cache().get("lock:T1").unwrap(), None);
}

#[test]
fn many_transactions_across_threads_get_exactly_one_verdict_each() {
    use rand::seq::SliceRandom;

    let system = Arc::new(system());
    let txns = 60usize;

    let mut handles = Vec::new();
    for source in ["core", "gateway"] {
        let system = Arc::clone(&system);
        handles.push(thread::spawn(move || {
            // Each worker delivers the same transactions in its own order
            let mut order: Vec<usize> = (0..txns).collect();
            order.shuffle(&mut rand::thread_rng());
            for i in order {
                let payload = format!(
                    r#"{{"txn_id":"T{i}","source":"{source}","amount":99.0,"status":"SUCCESS","currency":"INR"}}"#
                );
                system
                    .engine()
                    .submit(serde_json::from_str(&payload).unwrap())
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = system.engine().statistics();
    assert_eq!(stats.total_reconciled, txns as u64);
    assert_eq!(stats.matched_verdicts, txns as u64);
    assert_eq!(stats.total_mismatches, 0);
    assert_eq!(stats.pending_reconciliation, 0);
}

#[test]
fn hammering_one_transaction_from_many_threads_stays_single_verdict() {
    let system = Arc::new(system());
    let (core, gateway) = clean_pair("T1");

    let mut handles = Vec::new();
    for _ in 0..4 {
        let system = Arc::clone(&system);
        let core = core.clone();
        let gateway = gateway.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..10 {
                system.engine().submit(core.clone()).unwrap();
                system.engine().submit(gateway.clone()).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Identical duplicates never relaunch reconciliation
    let stats = system.engine().statistics();
    assert_eq!(stats.total_reconciled, 1);
    assert_eq!(stats.total_mismatches, 0);
}

#[test]
fn verdict_sources_are_a_quorum_of_configured_sources() {
    let system = system();
    let configured = system.engine().config().sources.clone();

    let (core, gateway) = clean_pair("T1");
    system.engine().submit(core).unwrap();
    system.engine().submit(gateway).unwrap();

    for verdict in system.engine().recent(10) {
        assert!(verdict.sources.len() >= 2);
        for source in &verdict.sources {
            assert!(configured.contains(source));
        }
    }
    for row in system.repository().list_views_by_txn("T1").unwrap() {
        assert!(row.reconciled_with_sources.len() >= 2);
    }
}
