//! Stream to verdict, through the ingestion workers.

use crate::common::system;
use crosscheck::{channel, Repository, ViewFilter};
use std::time::Duration;

fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn three_streams_end_to_end() {
    let system = system();
    let mut hub = system.ingest_hub();

    let (core_tx, core_rx) = channel();
    let (gateway_tx, gateway_rx) = channel();
    let (mobile_tx, mobile_rx) = channel();
    hub.attach("core", Box::new(core_rx));
    hub.attach("gateway", Box::new(gateway_rx));
    hub.attach("mobile", Box::new(mobile_rx));
    assert_eq!(hub.status().sources.len(), 3);

    // T1 agrees everywhere; T2 disagrees on amount between core and gateway
    core_tx.send(r#"{"txn_id":"T1","source":"core","amount":50.0,"status":"SUCCESS","reference":"R-1"}"#);
    gateway_tx.send(r#"{"txn_id":"T1","source":"gateway","amount":50.0,"status":"SUCCESS"}"#);
    core_tx.send(r#"{"txn_id":"T2","source":"core","amount":75.0,"status":"SUCCESS"}"#);
    gateway_tx.send(r#"{"txn_id":"T2","source":"gateway","amount":80.0,"status":"SUCCESS"}"#);
    mobile_tx.send("definitely not json");

    assert!(wait_until(Duration::from_secs(3), || {
        system.engine().statistics().total_reconciled == 2 && hub.malformed_count() == 1
    }));

    let stats = system.engine().statistics();
    assert_eq!(stats.matched_verdicts, 1);
    assert_eq!(stats.mismatched_verdicts, 1);

    // Unknown payload fields survive into the repository untouched
    let rows = system
        .repository()
        .list_views(&ViewFilter {
            source: Some("core".into()),
            ..Default::default()
        })
        .unwrap();
    let tagged = rows
        .iter()
        .find(|r| r.view.txn_id == "T1")
        .expect("core view of T1 persisted");
    assert_eq!(tagged.view.extra["reference"], serde_json::json!("R-1"));

    hub.shutdown();
    assert_eq!(hub.status().active_consumers, 0);
}

#[test]
fn consumers_survive_interleaved_garbage() {
    let system = system();
    let mut hub = system.ingest_hub();

    let (tx, rx) = channel();
    hub.attach("core", Box::new(rx));

    for i in 0..5 {
        tx.send(format!(
            r#"{{"txn_id":"T{i}","source":"core","amount":1.0,"status":"SUCCESS"}}"#
        ));
        tx.send("%% noise %%");
    }

    assert!(wait_until(Duration::from_secs(3), || {
        hub.malformed_count() == 5 && system.engine().statistics().pending_reconciliation == 5
    }));
    hub.shutdown();
}
