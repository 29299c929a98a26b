//! Verdicts: the engine's decision for a reconciled transaction group

use crate::mismatch::Mismatch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a reconciliation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerdictStatus {
    /// No comparison rule fired for any pair of sources.
    #[serde(rename = "MATCHED")]
    Matched,
    /// At least one rule fired.
    #[serde(rename = "MISMATCH")]
    Mismatch,
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerdictStatus::Matched => "MATCHED",
            VerdictStatus::Mismatch => "MISMATCH",
        };
        f.write_str(s)
    }
}

/// One verdict per reconciled transaction id.
///
/// A group is `Matched` exactly when `mismatches` is empty. Sources are in
/// lexicographic order so identical inputs produce identical payloads
/// regardless of arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Transaction id the verdict applies to.
    pub txn_id: String,
    /// Sources that participated, lexicographically ordered. At least two.
    pub sources: Vec<String>,
    /// Matched or mismatch.
    pub status: VerdictStatus,
    /// Wall-clock instant the verdict was decided.
    pub decided_at: DateTime<Utc>,
    /// Every mismatch detected in this attempt, in rule order.
    pub mismatches: Vec<Mismatch>,
}

impl Verdict {
    /// True when no rule fired.
    pub fn is_matched(&self) -> bool {
        self.status == VerdictStatus::Matched
    }
}
