//! Stream Module
//!
//! Input streams and the multiplexer that merges them.
//!
//! ## Responsibilities
//! - Create bounded input streams bound to a stream key
//! - Stamp every pushed value as a `LogEntry` (type, data, fact-time)
//! - Merge all streams into one consumption point for the writer loop
//!
//! ## Flow
//! ```text
//!  Producer<T> ──push──▶ [bounded buffer] ──┐
//!  Producer<U> ──push──▶ [bounded buffer] ──┼──▶ Multiplexer ──▶ writer loop
//!  Producer<V> ──push──▶ [bounded buffer] ──┘
//! ```
//!
//! A full buffer blocks its producer; that is the only backpressure.

mod mux;

use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use serde::Serialize;
use serde_json::Value;

use crate::entry::LogEntry;
use crate::error::{EvlogError, Result};

pub use mux::{Event, Multiplexer};

type Encoder<T> = dyn Fn(T) -> serde_json::Result<Value> + Send + Sync;

/// Producing side of an input stream
pub struct Producer<T> {
    key: Arc<str>,
    tx: Sender<LogEntry>,
    encode: Arc<Encoder<T>>,
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            tx: self.tx.clone(),
            encode: Arc::clone(&self.encode),
        }
    }
}

impl<T> Producer<T> {
    /// Push a value, blocking while the stream's buffer is full
    ///
    /// Fails with `SourceClosed` once the consuming side is gone.
    pub fn push(&self, value: T) -> Result<()> {
        let data = (self.encode)(value)?;
        let entry = LogEntry::new(&*self.key, data);
        self.tx
            .send(entry)
            .map_err(|_| EvlogError::SourceClosed(self.key.to_string()))
    }

    /// Stream key stamped on every entry
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Consuming side of an input stream, handed to the logger
pub struct Source {
    key: String,
    rx: Receiver<LogEntry>,
}

impl Source {
    /// Stream key this source was created with
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of entries waiting in the buffer
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub(crate) fn into_receiver(self) -> Receiver<LogEntry> {
        self.rx
    }
}

/// Create a bounded input stream for `key`
pub fn bounded<T>(key: impl Into<String>, capacity: usize) -> (Producer<T>, Source)
where
    T: Serialize + 'static,
{
    bounded_with(key, capacity, |value: T| value)
}

/// Create a bounded input stream for `key` that transforms values before encoding
pub fn bounded_with<T, U, F>(key: impl Into<String>, capacity: usize, transform: F) -> (Producer<T>, Source)
where
    T: 'static,
    U: Serialize + 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    let key = key.into();
    let (tx, rx) = channel::bounded(capacity);
    let encode = move |value: T| serde_json::to_value(transform(value));

    let producer = Producer {
        key: Arc::from(key.as_str()),
        tx,
        encode: Arc::new(encode),
    };

    (producer, Source { key, rx })
}
