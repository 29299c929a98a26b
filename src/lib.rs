//! # Crosscheck
//!
//! A real-time reconciliation engine for financial transactions reported by
//! independent source systems. Each source publishes its own view of a
//! transaction onto its own ordered stream; Crosscheck groups views that
//! share a transaction id, compares them pairwise under a fleet-wide
//! single-flight lock, and durably records a MATCHED verdict or a set of
//! typed mismatches for every group that reaches quorum.
//!
//! # Quick start
//!
//! ```no_run
//! use crosscheck::{Crosscheck, ReconConfig};
//!
//! let system = Crosscheck::in_memory(ReconConfig::default());
//!
//! // Feed views from two sources
//! let core: crosscheck::TransactionView = serde_json::from_str(
//!     r#"{"txn_id":"T1","source":"core","amount":1234.56,"status":"SUCCESS"}"#,
//! ).unwrap();
//! let gateway: crosscheck::TransactionView = serde_json::from_str(
//!     r#"{"txn_id":"T1","source":"gateway","amount":1234.56,"status":"SUCCESS"}"#,
//! ).unwrap();
//! system.engine().submit(core).unwrap();
//! system.engine().submit(gateway).unwrap();
//!
//! // The second distinct source completes the quorum and decides a verdict
//! assert_eq!(system.engine().statistics().total_reconciled, 1);
//! assert!(system.engine().recent(1)[0].is_matched());
//! ```
//!
//! # Components
//!
//! | Component | Crate | Responsibility |
//! |-----------|-------|----------------|
//! | Core types | `crosscheck-core` | Views, verdicts, the mismatch taxonomy |
//! | Coordination cache | `crosscheck-cache` | Keyed TTL store: staging, locks, throttles, read caches |
//! | Repository | `crosscheck-store` | Durable views, verdicts, mismatches; stats queries |
//! | Engine | `crosscheck-engine` | Grouping, single-flight, comparison rules, persistence |
//! | Ingestion | `crosscheck-ingest` | One consumer worker per source stream |
//! | Stats projector | `crosscheck-stats` | Cache-first dashboard metrics |
//!
//! The cache and the repository are abstract traits; the bundled in-memory
//! implementations serve embedding and tests, and a deployment substitutes
//! its own backends without touching the engine.

pub use crosscheck_cache::{
    CacheError, CacheInfo, CacheResult, CoordinationCache, MemoryCache, StagedView,
};
pub use crosscheck_core::{
    Mismatch, MismatchKind, MismatchState, MismatchType, PersistedView, ReconStatus, Severity,
    TransactionView, Verdict, VerdictStatus, ViewError,
};
pub use crosscheck_engine::{
    ConfigError, EngineError, EngineStats, ReconConfig, ReconEngine, CONFIG_FILE_NAME,
};
pub use crosscheck_ingest::{
    channel, ChannelStream, IngestHub, IngestStatus, StreamPoll, StreamSender, ViewStream,
};
pub use crosscheck_stats::StatsProjector;
pub use crosscheck_store::{
    ActivityStats, AggregateStats, HealthState, HealthSummary, MemoryRepository, MismatchFilter,
    RecentActivity, Repository, StoreError, StoreResult, StoredMismatch, TimelineBucket,
    TimelineInterval, ViewFilter,
};

use std::sync::Arc;

/// A fully wired in-process deployment: in-memory cache and repository, the
/// engine, and a stats projector over the pair.
///
/// Production deployments construct [`ReconEngine`] and [`StatsProjector`]
/// directly over their own cache and repository backends; this bundle exists
/// for embedding, demos, and tests.
pub struct Crosscheck {
    cache: Arc<MemoryCache>,
    repo: Arc<MemoryRepository>,
    engine: Arc<ReconEngine>,
    projector: StatsProjector,
}

impl Crosscheck {
    /// Wire an engine and projector over fresh in-memory backends.
    pub fn in_memory(config: ReconConfig) -> Self {
        let cache = Arc::new(MemoryCache::new());
        let repo = Arc::new(MemoryRepository::new());
        let stats_ttl = config.stats_cache_ttl();
        let engine = Arc::new(ReconEngine::new(
            Arc::clone(&cache) as Arc<dyn CoordinationCache>,
            Arc::clone(&repo) as Arc<dyn Repository>,
            config,
        ));
        let projector = StatsProjector::new(
            Arc::clone(&cache) as Arc<dyn CoordinationCache>,
            Arc::clone(&repo) as Arc<dyn Repository>,
            stats_ttl,
            crosscheck_cache::keys::API_CACHE_TTL,
        );
        Self {
            cache,
            repo,
            engine,
            projector,
        }
    }

    /// The reconciliation engine.
    pub fn engine(&self) -> &Arc<ReconEngine> {
        &self.engine
    }

    /// The stats projector.
    pub fn projector(&self) -> &StatsProjector {
        &self.projector
    }

    /// The in-memory coordination cache.
    pub fn cache(&self) -> &Arc<MemoryCache> {
        &self.cache
    }

    /// The in-memory repository.
    pub fn repository(&self) -> &Arc<MemoryRepository> {
        &self.repo
    }

    /// Build an ingest hub feeding this deployment's engine.
    pub fn ingest_hub(&self) -> IngestHub {
        IngestHub::new(Arc::clone(&self.engine))
    }
}
