//! Pairwise comparison rules
//!
//! For every unordered pair of sources in a group the five field rules run
//! in order; none of them short-circuits, so one verdict can carry several
//! mismatches. After the pairwise pass a group-level scan reports fields
//! that some sources carry and others lack.
//!
//! Sources are iterated in lexicographic order, so the same multiset of
//! views always produces the same mismatch list regardless of arrival order.

use chrono::{DateTime, SecondsFormat, Utc};
use crosscheck_core::{Mismatch, MismatchKind, MismatchState, TransactionView};
use std::collections::BTreeMap;

/// Tolerances and defaults the rules close over.
#[derive(Debug, Clone, Copy)]
pub struct RuleSettings<'a> {
    /// Absolute amount difference below which two amounts agree.
    pub amount_tolerance: f64,
    /// Absolute timestamp difference, in seconds, below which two instants
    /// agree.
    pub time_tolerance_seconds: i64,
    /// Currency assumed when a source omits one.
    pub home_currency: &'a str,
}

/// Fields covered by the group-level missing-field scan.
const SCANNED_FIELDS: [&str; 3] = ["amount", "status", "account_id"];

fn field_present(view: &TransactionView, field: &str) -> bool {
    match field {
        "amount" => view.amount.is_some(),
        "status" => view.status.is_some(),
        "account_id" => view.account_id.is_some(),
        _ => false,
    }
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Run every rule over the group and return the detected mismatches in
/// deterministic order.
pub fn detect_mismatches(
    txn_id: &str,
    group: &BTreeMap<String, TransactionView>,
    settings: &RuleSettings<'_>,
    detected_at: DateTime<Utc>,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    let make = |kind: MismatchKind,
                detail: String,
                sources: Vec<String>,
                expected: Option<String>,
                actual: Option<String>| Mismatch {
        txn_id: txn_id.to_string(),
        kind,
        detail,
        sources,
        expected_value: expected,
        actual_value: actual,
        state: MismatchState::Open,
        detected_at,
    };

    let names: Vec<&String> = group.keys().collect();
    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            let (a_name, b_name) = (names[i], names[j]);
            let a = &group[a_name];
            let b = &group[b_name];
            let pair = vec![a_name.clone(), b_name.clone()];

            let (a_amount, b_amount) = (a.amount_or_zero(), b.amount_or_zero());
            let difference = (a_amount - b_amount).abs();
            if difference > settings.amount_tolerance {
                mismatches.push(make(
                    MismatchKind::Amount { difference },
                    format!("Amount differs: {a_name}={a_amount:.2}, {b_name}={b_amount:.2}"),
                    pair.clone(),
                    Some(format!("{a_amount:.2}")),
                    Some(format!("{b_amount:.2}")),
                ));
            }

            let (a_status, b_status) = (a.status_upper(), b.status_upper());
            if a_status != b_status {
                mismatches.push(make(
                    MismatchKind::Status,
                    format!("Status differs: {a_name}={a_status}, {b_name}={b_status}"),
                    pair.clone(),
                    Some(a_status),
                    Some(b_status),
                ));
            }

            let a_currency = a.currency_or(settings.home_currency);
            let b_currency = b.currency_or(settings.home_currency);
            if a_currency != b_currency {
                mismatches.push(make(
                    MismatchKind::Currency,
                    format!("Currency differs: {a_name}={a_currency}, {b_name}={b_currency}"),
                    pair.clone(),
                    Some(a_currency.to_string()),
                    Some(b_currency.to_string()),
                ));
            }

            if let (Some(a_account), Some(b_account)) = (&a.account_id, &b.account_id) {
                if a_account != b_account {
                    mismatches.push(make(
                        MismatchKind::Account,
                        format!(
                            "Account id differs: {a_name}={a_account}, {b_name}={b_account}"
                        ),
                        pair.clone(),
                        Some(a_account.clone()),
                        Some(b_account.clone()),
                    ));
                }
            }

            if let (Some(a_ts), Some(b_ts)) = (a.timestamp, b.timestamp) {
                let delta_seconds = (a_ts - b_ts).num_seconds().abs();
                if delta_seconds > settings.time_tolerance_seconds {
                    mismatches.push(make(
                        MismatchKind::Timestamp { delta_seconds },
                        format!(
                            "Timestamp differs by {delta_seconds}s: {a_name}={}, {b_name}={}",
                            rfc3339(a_ts),
                            rfc3339(b_ts)
                        ),
                        pair.clone(),
                        Some(rfc3339(a_ts)),
                        Some(rfc3339(b_ts)),
                    ));
                }
            }
        }
    }

    for field in SCANNED_FIELDS {
        let present_somewhere = group.values().any(|v| field_present(v, field));
        if !present_somewhere {
            continue;
        }
        let missing: Vec<String> = group
            .iter()
            .filter(|(_, v)| !field_present(v, field))
            .map(|(name, _)| name.clone())
            .collect();
        if !missing.is_empty() {
            let listed = missing.join(", ");
            mismatches.push(make(
                MismatchKind::MissingField {
                    field: field.to_string(),
                },
                format!("Field '{field}' missing in sources: {listed}"),
                missing,
                None,
                None,
            ));
        }
    }

    mismatches
}
