//! The abstract delivery stream
//!
//! A [`ViewStream`] yields one serialised view at a time with at-least-once
//! semantics and per-source FIFO ordering. [`ChannelStream`] is the
//! in-process implementation used for embedding and tests; a production
//! deployment puts a message-broker consumer behind the same trait.

use std::sync::mpsc;
use std::time::Duration;

/// One poll of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPoll {
    /// A serialised view payload.
    Payload(String),
    /// Nothing arrived inside the poll timeout.
    Idle,
    /// The stream has ended and will never yield again.
    Closed,
}

/// A subscribe-and-deliver channel for one source stream.
pub trait ViewStream: Send {
    /// Wait up to `timeout` for the next payload.
    fn recv(&mut self, timeout: Duration) -> StreamPoll;
}

/// Producer half of an in-process stream.
#[derive(Clone)]
pub struct StreamSender {
    tx: mpsc::Sender<String>,
}

impl StreamSender {
    /// Publish one serialised view. Returns false when the consumer is gone.
    pub fn send(&self, payload: impl Into<String>) -> bool {
        self.tx.send(payload.into()).is_ok()
    }
}

/// Consumer half of an in-process stream.
pub struct ChannelStream {
    rx: mpsc::Receiver<String>,
}

impl ViewStream for ChannelStream {
    fn recv(&mut self, timeout: Duration) -> StreamPoll {
        match self.rx.recv_timeout(timeout) {
            Ok(payload) => StreamPoll::Payload(payload),
            Err(mpsc::RecvTimeoutError::Timeout) => StreamPoll::Idle,
            Err(mpsc::RecvTimeoutError::Disconnected) => StreamPoll::Closed,
        }
    }
}

/// Create a connected in-process stream pair.
pub fn channel() -> (StreamSender, ChannelStream) {
    let (tx, rx) = mpsc::channel();
    (StreamSender { tx }, ChannelStream { rx })
}
