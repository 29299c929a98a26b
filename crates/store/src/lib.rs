//! Durable repository for the Crosscheck reconciliation engine
//!
//! The repository is the sole source of truth: one logical table of
//! transaction views (one row per submission) and one of mismatches
//! (immutable once inserted). [`Repository`] is the abstract interface any
//! SQL or document store satisfies; [`MemoryRepository`] is the in-process
//! implementation used for embedding and tests.
//!
//! The read side also carries the aggregate statistics, timeline bucketing,
//! and health summary consumed by the stats projector.

pub mod memory;
pub mod stats;
pub mod traits;

pub use memory::MemoryRepository;
pub use stats::{
    ActivityStats, AggregateStats, HealthState, HealthSummary, RecentActivity, TimelineBucket,
    TimelineInterval,
};
pub use traits::{
    MismatchFilter, Repository, StoreError, StoreResult, StoredMismatch, ViewFilter,
};
