//! Source ingestion for the Crosscheck reconciliation engine
//!
//! One logical consumer per source stream. Each consumer runs on its own
//! named worker thread, pulls serialised payloads off its stream,
//! deserialises them, tags them with the source name, and submits them to
//! the engine. Malformed payloads are logged, counted, and skipped; a
//! consumer never stops on bad input.
//!
//! Delivery is at-least-once and FIFO within a source; nothing is assumed
//! about ordering across sources.

pub mod consumer;
pub mod stream;

pub use consumer::{IngestHub, IngestStatus};
pub use stream::{channel, ChannelStream, StreamPoll, StreamSender, ViewStream};
