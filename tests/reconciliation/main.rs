//! End-to-end reconciliation suites over the public facade.

mod common;

mod degradation;
mod idempotence;
mod ingest_flow;
mod scenarios;
mod single_flight;
mod stats_contract;
