//! Duplicate submissions and re-attempts: verdicts stay stable, mismatch
//! rows are append-only.

use crate::common::{clean_pair, system, view};
use crosscheck::{MismatchFilter, Repository};

#[test]
fn resubmitting_the_same_view_changes_no_verdict() {
    let system = system();
    let (core, gateway) = clean_pair("T1");
    system.engine().submit(core.clone()).unwrap();
    system.engine().submit(gateway.clone()).unwrap();

    let before = system.engine().recent(10);
    system.engine().submit(core).unwrap();
    system.engine().submit(gateway).unwrap();
    let after = system.engine().recent(10);

    assert_eq!(before, after);
    assert_eq!(system.engine().statistics().total_reconciled, 1);
}

#[test]
fn mismatch_rows_are_never_mutated_by_later_attempts() {
    let system = system();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"core","amount":100.0,"status":"SUCCESS"}"#,
    )).unwrap();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"gateway","amount":200.0,"status":"SUCCESS"}"#,
    )).unwrap();

    let first = system
        .repository()
        .list_mismatches(&MismatchFilter::default())
        .unwrap();
    assert_eq!(first.len(), 1);

    // A third source reopens the group and appends its own mismatches
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"mobile","amount":100.0,"status":"SUCCESS"}"#,
    )).unwrap();

    let second = system
        .repository()
        .list_mismatches(&MismatchFilter::default())
        .unwrap();
    assert!(second.len() > first.len());

    // The original row is still there, byte for byte
    let original = second.iter().find(|m| m.id == first[0].id).unwrap();
    assert_eq!(original, &first[0]);
}

#[test]
fn duplicate_rows_are_visible_to_the_duplicate_counter() {
    let system = system();
    let (core, gateway) = clean_pair("T1");
    system.engine().submit(core.clone()).unwrap();
    system.engine().submit(core).unwrap();
    system.engine().submit(gateway).unwrap();

    assert_eq!(system.projector().duplicate_count().unwrap(), 1);
    assert_eq!(system.engine().statistics().total_reconciled, 1);
}

#[test]
fn pending_views_stay_pending_without_quorum() {
    let system = system();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"core","amount":10.0,"status":"SUCCESS"}"#,
    )).unwrap();

    let rows = system.repository().list_views_by_txn("T1").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].reconciliation_status, crosscheck::ReconStatus::Pending);
    assert!(rows[0].reconciled_at.is_none());
    assert_eq!(system.engine().statistics().pending_reconciliation, 1);
}
