//! Core types for the Crosscheck reconciliation engine
//!
//! This crate defines the foundational types used throughout the system:
//! - TransactionView: one source's report of one transaction
//! - PersistedView: a view as recorded by the durable repository
//! - Verdict: the engine's decision for a reconciled transaction group
//! - Mismatch / MismatchKind: the typed mismatch taxonomy
//! - Severity, MismatchState, ReconStatus, VerdictStatus: closed enums
//!   shared by the engine, the repository, and the read surfaces

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod mismatch;
pub mod verdict;
pub mod view;

pub use mismatch::{Mismatch, MismatchKind, MismatchState, MismatchType, Severity};
pub use verdict::{Verdict, VerdictStatus};
pub use view::{PersistedView, ReconStatus, TransactionView, ViewError};
