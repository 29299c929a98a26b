//! Literal input-to-output scenarios.

use crate::common::{clean_pair, last_verdict, only_verdict, system, view};
use crosscheck::{MismatchType, Severity, VerdictStatus};

#[test]
fn clean_match_across_two_sources() {
    let system = system();
    let (core, gateway) = clean_pair("T1");
    system.engine().submit(core).unwrap();
    system.engine().submit(gateway).unwrap();

    let verdict = only_verdict(&system);
    assert_eq!(verdict.status, VerdictStatus::Matched);
    assert!(verdict.mismatches.is_empty());
    assert_eq!(verdict.sources, vec!["core", "gateway"]);
}

#[test]
fn amount_difference_beyond_tolerance() {
    let system = system();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"core","amount":1234.56,"status":"SUCCESS","currency":"INR","account_id":"A1"}"#,
    )).unwrap();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"gateway","amount":1234.60,"status":"SUCCESS","currency":"INR","account_id":"A1"}"#,
    )).unwrap();

    let verdict = only_verdict(&system);
    assert_eq!(verdict.status, VerdictStatus::Mismatch);
    assert_eq!(verdict.mismatches.len(), 1);

    let m = &verdict.mismatches[0];
    assert_eq!(m.mismatch_type(), MismatchType::Amount);
    assert_eq!(m.severity(), Severity::High);
    assert!((m.difference_amount().unwrap() - 0.04).abs() < 1e-9);
    assert_eq!(m.expected_value.as_deref(), Some("1234.56"));
    assert_eq!(m.actual_value.as_deref(), Some("1234.60"));
}

#[test]
fn status_and_currency_diverge_in_one_verdict() {
    let system = system();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"core","amount":500.0,"status":"SUCCESS","currency":"INR"}"#,
    )).unwrap();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"mobile","amount":500.0,"status":"PENDING","currency":"USD"}"#,
    )).unwrap();

    let verdict = only_verdict(&system);
    assert_eq!(verdict.status, VerdictStatus::Mismatch);
    assert_eq!(verdict.mismatches.len(), 2);
    assert_eq!(verdict.mismatches[0].mismatch_type(), MismatchType::Status);
    assert_eq!(verdict.mismatches[0].severity(), Severity::Medium);
    assert_eq!(verdict.mismatches[1].mismatch_type(), MismatchType::Currency);
    assert_eq!(verdict.mismatches[1].severity(), Severity::High);
}

#[test]
fn timestamps_inside_tolerance_match() {
    let system = system();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"core","amount":1.0,"status":"SUCCESS","timestamp":"2024-01-01T10:00:00Z"}"#,
    )).unwrap();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"gateway","amount":1.0,"status":"SUCCESS","timestamp":"2024-01-01T10:04:59Z"}"#,
    )).unwrap();

    assert_eq!(only_verdict(&system).status, VerdictStatus::Matched);
}

#[test]
fn timestamps_beyond_tolerance_mismatch() {
    let system = system();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"core","amount":1.0,"status":"SUCCESS","timestamp":"2024-01-01T10:00:00Z"}"#,
    )).unwrap();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"gateway","amount":1.0,"status":"SUCCESS","timestamp":"2024-01-01T10:05:01Z"}"#,
    )).unwrap();

    let verdict = only_verdict(&system);
    assert_eq!(verdict.mismatches.len(), 1);
    assert_eq!(
        verdict.mismatches[0].mismatch_type(),
        MismatchType::Timestamp
    );
    assert_eq!(verdict.mismatches[0].severity(), Severity::Low);
}

#[test]
fn three_sources_one_divergent() {
    let system = system();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"core","amount":100.0,"status":"SUCCESS","currency":"INR"}"#,
    )).unwrap();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"gateway","amount":100.0,"status":"SUCCESS","currency":"INR"}"#,
    )).unwrap();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"mobile","amount":101.0,"status":"SUCCESS","currency":"INR"}"#,
    )).unwrap();

    // The third source re-opens the group; the final verdict covers all three
    let verdict = last_verdict(&system);
    assert_eq!(verdict.sources, vec!["core", "gateway", "mobile"]);
    assert_eq!(verdict.mismatches.len(), 2);
    assert!(verdict
        .mismatches
        .iter()
        .all(|m| m.mismatch_type() == MismatchType::Amount));
    assert_eq!(verdict.mismatches[0].sources, vec!["core", "mobile"]);
    assert_eq!(verdict.mismatches[1].sources, vec!["gateway", "mobile"]);
}

#[test]
fn missing_account_is_reported_per_lacking_source() {
    let system = system();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"core","amount":100.0,"status":"SUCCESS","account_id":"A1"}"#,
    )).unwrap();
    system.engine().submit(view(
        r#"{"txn_id":"T1","source":"gateway","amount":100.0,"status":"SUCCESS"}"#,
    )).unwrap();

    let verdict = only_verdict(&system);
    assert_eq!(verdict.mismatches.len(), 1);
    let m = &verdict.mismatches[0];
    assert_eq!(m.mismatch_type(), MismatchType::MissingField);
    assert_eq!(m.severity(), Severity::Medium);
    assert_eq!(m.sources, vec!["gateway"]);
    assert_eq!(m.detail, "Field 'account_id' missing in sources: gateway");
}

#[test]
fn matched_exactly_when_no_mismatches() {
    let system = system();
    let (core, gateway) = clean_pair("T1");
    system.engine().submit(core).unwrap();
    system.engine().submit(gateway).unwrap();
    system.engine().submit(view(
        r#"{"txn_id":"T2","source":"core","amount":10.0,"status":"SUCCESS","currency":"USD"}"#,
    )).unwrap();
    system.engine().submit(view(
        r#"{"txn_id":"T2","source":"gateway","amount":10.0,"status":"SUCCESS","currency":"INR"}"#,
    )).unwrap();

    for verdict in system.engine().recent(10) {
        assert_eq!(
            verdict.status == VerdictStatus::Matched,
            verdict.mismatches.is_empty()
        );
    }
}
