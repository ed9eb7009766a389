//! Asynchronous message hand-off.
//!
//! # Data Flow
//! ```text
//! QueueProducer (request task)
//!     → MessageSink::enqueue (non-blocking, bounded)
//!     → delivery.rs task drains the queue in the background
//! ```
//!
//! # Design Decisions
//! - Enqueue never waits: a full queue is reported to the caller as 503
//! - Many request tasks enqueue concurrently; ordering across requests is
//!   not guaranteed
//! - The broker wire format sits behind `MessageSink` and is not modelled here

pub mod delivery;

use std::fmt;

use axum::body::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::auth::Identity;

/// A request body handed off for asynchronous processing.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    pub topic: String,
    pub payload: Bytes,
    pub request_id: String,
    /// Authenticated caller, present for secure routes.
    pub sender: Option<Identity>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProducerError {
    #[error("message queue is full")]
    Full,
    #[error("message queue is closed")]
    Closed,
}

/// Destination for produced messages. Must tolerate concurrent callers.
pub trait MessageSink: Send + Sync + fmt::Debug {
    fn enqueue(&self, message: QueuedMessage) -> Result<(), ProducerError>;
}

/// Bounded in-process queue backed by a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<QueuedMessage>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its queue.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<QueuedMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl MessageSink for ChannelSink {
    fn enqueue(&self, message: QueuedMessage) -> Result<(), ProducerError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ProducerError::Full,
            mpsc::error::TrySendError::Closed(_) => ProducerError::Closed,
        })
    }
}
