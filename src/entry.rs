//! Log entry definitions
//!
//! Defines the unit that travels from an input stream to the writer loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single event produced by an input stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Stream tag (the key the producing stream was created with)
    #[serde(rename = "type")]
    pub kind: String,

    /// Opaque payload
    pub data: Value,

    /// When the event was produced, independent of when it is written
    pub fact_time: DateTime<Utc>,
}

impl LogEntry {
    /// Stamp a payload with its stream tag and the current time
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
            fact_time: Utc::now(),
        }
    }

    /// JSON text of the payload, as stored in the `data` column
    pub fn data_text(&self) -> String {
        // Serializing a `Value` into a String cannot fail
        self.data.to_string()
    }
}
