//! Per-source consumer workers
//!
//! The hub owns one worker thread per attached source. Workers poll their
//! stream, parse each payload, tag it with the source name, and submit it to
//! the engine. A malformed payload is logged and skipped; the worker keeps
//! consuming. Workers stop when their stream closes or the hub shuts down.

use crate::stream::{StreamPoll, ViewStream};
use crosscheck_core::TransactionView;
use crosscheck_engine::ReconEngine;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Status snapshot of the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestStatus {
    /// False once shutdown has been requested.
    pub running: bool,
    /// Sources a consumer was attached for.
    pub sources: Vec<String>,
    /// Consumers whose worker thread is still alive.
    pub active_consumers: usize,
    /// Payloads skipped because they failed to parse or validate.
    pub malformed: u64,
}

/// Owns the consumer workers feeding one engine.
pub struct IngestHub {
    engine: Arc<ReconEngine>,
    shutdown: Arc<AtomicBool>,
    malformed: Arc<AtomicU64>,
    workers: Vec<(String, JoinHandle<()>)>,
}

impl IngestHub {
    /// Create a hub feeding the given engine.
    pub fn new(engine: Arc<ReconEngine>) -> Self {
        Self {
            engine,
            shutdown: Arc::new(AtomicBool::new(false)),
            malformed: Arc::new(AtomicU64::new(0)),
            workers: Vec::new(),
        }
    }

    /// Attach a consumer for `source`, spawning its worker thread.
    ///
    /// Consumers run independently; the engine does not require the full
    /// configured set of sources to be up.
    pub fn attach(&mut self, source: impl Into<String>, stream: Box<dyn ViewStream>) {
        let source = source.into();
        let engine = Arc::clone(&self.engine);
        let shutdown = Arc::clone(&self.shutdown);
        let malformed = Arc::clone(&self.malformed);
        let worker_source = source.clone();

        let handle = std::thread::Builder::new()
            .name(format!("crosscheck-ingest-{source}"))
            .spawn(move || consume_loop(&worker_source, stream, &engine, &shutdown, &malformed))
            .expect("failed to spawn ingest worker thread");

        info!(target: "crosscheck::ingest", source = %source, "consumer attached");
        self.workers.push((source, handle));
    }

    /// Payloads skipped so far across every consumer.
    pub fn malformed_count(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    /// Status snapshot.
    pub fn status(&self) -> IngestStatus {
        IngestStatus {
            running: !self.shutdown.load(Ordering::Acquire),
            sources: self.workers.iter().map(|(s, _)| s.clone()).collect(),
            active_consumers: self
                .workers
                .iter()
                .filter(|(_, handle)| !handle.is_finished())
                .count(),
            malformed: self.malformed_count(),
        }
    }

    /// Stop every consumer and join its thread. Staged views stay owned by
    /// the coordination cache; nothing is flushed.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        for (source, handle) in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!(target: "crosscheck::ingest", source = %source, "consumer panicked");
            }
        }
        info!(target: "crosscheck::ingest", "all consumers stopped");
    }
}

impl Drop for IngestHub {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.shutdown();
        }
    }
}

fn consume_loop(
    source: &str,
    mut stream: Box<dyn ViewStream>,
    engine: &ReconEngine,
    shutdown: &AtomicBool,
    malformed: &AtomicU64,
) {
    info!(target: "crosscheck::ingest", source = %source, "consumer started");
    while !shutdown.load(Ordering::Acquire) {
        match stream.recv(POLL_INTERVAL) {
            StreamPoll::Payload(raw) => {
                let mut view: TransactionView = match serde_json::from_str(&raw) {
                    Ok(view) => view,
                    Err(e) => {
                        malformed.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            target: "crosscheck::ingest",
                            source = %source,
                            error = %e,
                            "skipping malformed payload"
                        );
                        continue;
                    }
                };
                if view.source != source {
                    debug!(
                        target: "crosscheck::ingest",
                        source = %source,
                        payload_source = %view.source,
                        txn_id = %view.txn_id,
                        "payload source differs from stream, retagging"
                    );
                    view.source = source.to_string();
                }
                if let Err(e) = engine.submit(view) {
                    malformed.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        target: "crosscheck::ingest",
                        source = %source,
                        error = %e,
                        "skipping invalid view"
                    );
                }
            }
            StreamPoll::Idle => {}
            StreamPoll::Closed => {
                info!(target: "crosscheck::ingest", source = %source, "stream closed");
                break;
            }
        }
    }
}
