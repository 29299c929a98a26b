//! Shared helpers for the reconciliation suites.

use crosscheck::{Crosscheck, ReconConfig, TransactionView, Verdict};

/// Parse a view payload the way the ingesters do.
pub fn view(json: &str) -> TransactionView {
    serde_json::from_str(json).expect("test payload must parse")
}

/// A fully wired in-memory deployment with default tunables.
pub fn system() -> Crosscheck {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Crosscheck::in_memory(ReconConfig::default())
}

/// Two agreeing views of one transaction from core and gateway.
pub fn clean_pair(txn: &str) -> (TransactionView, TransactionView) {
    (
        view(&format!(
            r#"{{"txn_id":"{txn}","source":"core","amount":1234.56,"status":"SUCCESS","currency":"INR","account_id":"A1"}}"#
        )),
        view(&format!(
            r#"{{"txn_id":"{txn}","source":"gateway","amount":1234.56,"status":"SUCCESS","currency":"INR","account_id":"A1"}}"#
        )),
    )
}

/// The single verdict a test expects to exist.
pub fn only_verdict(system: &Crosscheck) -> Verdict {
    let recent = system.engine().recent(10);
    assert_eq!(recent.len(), 1, "expected exactly one verdict");
    recent.into_iter().next().unwrap()
}

/// The most recent verdict.
pub fn last_verdict(system: &Crosscheck) -> Verdict {
    system
        .engine()
        .recent(100)
        .pop()
        .expect("expected at least one verdict")
}
