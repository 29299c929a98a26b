//! The typed mismatch taxonomy
//!
//! The six mismatch kinds form a closed set. `MismatchKind` is the tagged sum
//! carrying per-variant evidence; `MismatchType` is the payload-free
//! discriminant used for filtering and distribution maps. Severity is a fixed
//! function of the kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity a mismatch is reported at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Money or identity disagreement.
    #[serde(rename = "HIGH")]
    High,
    /// Lifecycle or completeness disagreement.
    #[serde(rename = "MEDIUM")]
    Medium,
    /// Timing disagreement beyond tolerance.
    #[serde(rename = "LOW")]
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        };
        f.write_str(s)
    }
}

/// Payload-free discriminant of a mismatch kind.
///
/// The serialised names are part of the audit-record contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MismatchType {
    /// Amounts differ beyond the absolute tolerance.
    #[serde(rename = "AMOUNT")]
    Amount,
    /// Statuses differ after case folding.
    #[serde(rename = "STATUS")]
    Status,
    /// Currency codes differ exactly.
    #[serde(rename = "CURRENCY")]
    Currency,
    /// Account ids differ where both sources reported one.
    #[serde(rename = "ACCOUNT")]
    Account,
    /// Timestamps differ beyond the time tolerance.
    #[serde(rename = "TIMESTAMP")]
    Timestamp,
    /// A compared field is present in some sources but absent in others.
    #[serde(rename = "MISSING_FIELD")]
    MissingField,
}

impl fmt::Display for MismatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MismatchType::Amount => "AMOUNT",
            MismatchType::Status => "STATUS",
            MismatchType::Currency => "CURRENCY",
            MismatchType::Account => "ACCOUNT",
            MismatchType::Timestamp => "TIMESTAMP",
            MismatchType::MissingField => "MISSING_FIELD",
        };
        f.write_str(s)
    }
}

/// The tagged mismatch sum, with per-variant evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MismatchKind {
    /// Amounts differ beyond tolerance; carries the absolute difference.
    #[serde(rename = "AMOUNT")]
    Amount {
        /// Absolute difference between the two amounts.
        difference: f64,
    },
    /// Statuses differ after case folding.
    #[serde(rename = "STATUS")]
    Status,
    /// Currency codes differ exactly.
    #[serde(rename = "CURRENCY")]
    Currency,
    /// Account ids differ where both sources reported one.
    #[serde(rename = "ACCOUNT")]
    Account,
    /// Timestamps differ beyond tolerance; carries the observed delta.
    #[serde(rename = "TIMESTAMP")]
    Timestamp {
        /// Absolute difference between the two instants, in seconds.
        delta_seconds: i64,
    },
    /// A compared field is absent in some of the group's sources.
    #[serde(rename = "MISSING_FIELD")]
    MissingField {
        /// Name of the field that is missing.
        field: String,
    },
}

impl MismatchKind {
    /// The payload-free discriminant of this kind.
    pub fn mismatch_type(&self) -> MismatchType {
        match self {
            MismatchKind::Amount { .. } => MismatchType::Amount,
            MismatchKind::Status => MismatchType::Status,
            MismatchKind::Currency => MismatchType::Currency,
            MismatchKind::Account => MismatchType::Account,
            MismatchKind::Timestamp { .. } => MismatchType::Timestamp,
            MismatchKind::MissingField { .. } => MismatchType::MissingField,
        }
    }

    /// Severity is a fixed function of the kind.
    pub fn severity(&self) -> Severity {
        match self {
            MismatchKind::Amount { .. } => Severity::High,
            MismatchKind::Status => Severity::Medium,
            MismatchKind::Currency => Severity::High,
            MismatchKind::Account => Severity::High,
            MismatchKind::Timestamp { .. } => Severity::Low,
            MismatchKind::MissingField { .. } => Severity::Medium,
        }
    }
}

/// Lifecycle state of a recorded mismatch.
///
/// The engine only ever writes the initial `Open`; later transitions are
/// driven by operators outside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MismatchState {
    /// Detected, not yet looked at.
    #[serde(rename = "OPEN")]
    Open,
    /// An operator is working the case.
    #[serde(rename = "INVESTIGATING")]
    Investigating,
    /// Root cause found and corrected upstream.
    #[serde(rename = "RESOLVED")]
    Resolved,
    /// Accepted as a known, tolerable divergence.
    #[serde(rename = "IGNORED")]
    Ignored,
}

impl fmt::Display for MismatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MismatchState::Open => "OPEN",
            MismatchState::Investigating => "INVESTIGATING",
            MismatchState::Resolved => "RESOLVED",
            MismatchState::Ignored => "IGNORED",
        };
        f.write_str(s)
    }
}

/// One detected mismatch, as emitted by the engine and recorded immutably by
/// the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Transaction id the mismatch belongs to.
    pub txn_id: String,
    /// Kind with per-variant evidence.
    pub kind: MismatchKind,
    /// Human-readable description naming the sources and values involved.
    pub detail: String,
    /// Sources participating in the disagreement, in lexicographic order.
    /// Always at least one.
    pub sources: Vec<String>,
    /// First observed value, in source-lexicographic order.
    pub expected_value: Option<String>,
    /// Second observed value, in source-lexicographic order.
    pub actual_value: Option<String>,
    /// Lifecycle state; the engine writes `Open`.
    pub state: MismatchState,
    /// Instant the mismatch was detected.
    pub detected_at: DateTime<Utc>,
}

impl Mismatch {
    /// The payload-free discriminant of this mismatch.
    pub fn mismatch_type(&self) -> MismatchType {
        self.kind.mismatch_type()
    }

    /// Severity derived from the kind.
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// Absolute amount difference when this is an amount mismatch.
    pub fn difference_amount(&self) -> Option<f64> {
        match self.kind {
            MismatchKind::Amount { difference } => Some(difference),
            _ => None,
        }
    }
}
