//! The Crosscheck reconciliation engine
//!
//! Groups per-transaction views across source streams, serialises
//! per-transaction work through a distributed single-flight lock, runs the
//! pairwise comparison rules, writes verdicts and mismatches through to the
//! repository, and keeps live counters for the operations surfaces.
//!
//! The engine is invoked concurrently from the ingestion workers. Different
//! transaction ids reconcile in parallel; the same transaction id is
//! strictly serialised across the whole fleet via the coordination cache.

pub mod compare;
pub mod config;
pub mod engine;
pub mod flight;

pub use config::{ConfigError, ReconConfig, CONFIG_FILE_NAME};
pub use engine::{EngineError, EngineStats, ReconEngine};
pub use flight::{FlightGuard, FlightTable};
