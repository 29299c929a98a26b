//! Transaction views as reported by source streams
//!
//! A `TransactionView` is one source's report of one transaction. Views that
//! share a `txn_id` across different sources describe the same logical
//! transaction and are grouped for comparison. `PersistedView` is the shape
//! the durable repository records: the view plus its reconciliation lifecycle
//! fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Error returned when a view fails structural validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    /// The `txn_id` field is absent or empty.
    #[error("view is missing a transaction id")]
    MissingTxnId,
    /// The `source` field is absent or empty.
    #[error("view is missing a source name")]
    MissingSource,
}

/// One source's report of one transaction.
///
/// Only `txn_id` and `source` are structurally required; every other field
/// may be absent in a payload. Absent fields still participate in
/// reconciliation through the missing-field rule. Fields not named here are
/// preserved in `extra` but never compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    /// Opaque identifier, equal across sources that describe the same
    /// logical transaction.
    pub txn_id: String,
    /// Symbolic name of the stream that reported this view.
    pub source: String,
    /// Transaction amount in currency minor-unit precision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Processing status as reported by the source. Compared
    /// case-insensitively against the other sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// ISO-4217 currency code. Absent means the deployment's home currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Account the transaction was booked against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Instant the source observed the transaction (RFC-3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Additional descriptive fields (reference, channel, merchant).
    /// Preserved verbatim, ignored for comparison.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TransactionView {
    /// Validate the structural invariants a view must satisfy before it can
    /// enter the engine.
    pub fn validate(&self) -> Result<(), ViewError> {
        if self.txn_id.trim().is_empty() {
            return Err(ViewError::MissingTxnId);
        }
        if self.source.trim().is_empty() {
            return Err(ViewError::MissingSource);
        }
        Ok(())
    }

    /// Status normalised for comparison: uppercased, absent reads as empty.
    pub fn status_upper(&self) -> String {
        self.status
            .as_deref()
            .unwrap_or("")
            .to_ascii_uppercase()
    }

    /// Amount used in pairwise comparison: absent reads as zero.
    pub fn amount_or_zero(&self) -> f64 {
        self.amount.unwrap_or(0.0)
    }

    /// Currency used in pairwise comparison, defaulting to the deployment's
    /// home currency when the source did not report one.
    pub fn currency_or<'a>(&'a self, home: &'a str) -> &'a str {
        self.currency.as_deref().unwrap_or(home)
    }
}

impl fmt::Display for TransactionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.txn_id, self.source)
    }
}

/// Reconciliation lifecycle of a persisted view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReconStatus {
    /// Recorded, awaiting a verdict for its transaction id.
    #[serde(rename = "PENDING")]
    Pending,
    /// A verdict was written and every pairwise rule passed.
    #[serde(rename = "MATCHED")]
    Matched,
    /// A verdict was written and at least one rule fired.
    #[serde(rename = "MISMATCH")]
    Mismatch,
}

impl fmt::Display for ReconStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReconStatus::Pending => "PENDING",
            ReconStatus::Matched => "MATCHED",
            ReconStatus::Mismatch => "MISMATCH",
        };
        f.write_str(s)
    }
}

/// A view as recorded by the durable repository.
///
/// Created in state `PENDING` when a view first arrives; transitions to
/// `MATCHED` or `MISMATCH` when the engine writes the verdict for its
/// transaction id. Views whose group never reaches quorum stay `PENDING`
/// indefinitely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedView {
    /// Repository-assigned row id.
    pub id: i64,
    /// The view as submitted.
    pub view: TransactionView,
    /// Current reconciliation lifecycle state.
    pub reconciliation_status: ReconStatus,
    /// Instant the verdict for this transaction id was written.
    pub reconciled_at: Option<DateTime<Utc>>,
    /// Sources that participated in the verdict.
    pub reconciled_with_sources: Vec<String>,
    /// Instant the repository recorded this view.
    pub created_at: DateTime<Utc>,
}
