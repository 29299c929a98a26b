//! Coordination cache for the Crosscheck reconciliation engine
//!
//! A keyed TTL store shared by every engine instance in a deployment. It
//! serves four jobs: staging in-flight views, holding single-flight
//! reconciliation locks, caching computed stats and read-side responses, and
//! throttling repeated checks. Every operation is best effort from the
//! engine's point of view: a failed cache call never propagates into the
//! decision path.
//!
//! [`CoordinationCache`] is the abstract interface (any Redis-like backend
//! satisfies it); [`MemoryCache`] is the in-process implementation used for
//! embedding and tests.

pub mod keys;
pub mod memory;
pub mod rate;
pub mod staging;
pub mod traits;

pub use memory::MemoryCache;
pub use rate::check_rate_limit;
pub use staging::StagedView;
pub use traits::{CacheError, CacheInfo, CacheResult, CoordinationCache};
