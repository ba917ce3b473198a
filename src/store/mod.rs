//! Store Module
//!
//! One segment file per store: a schema header followed by appended rows.
//!
//! ## Responsibilities
//! - Create a segment file, or reopen one and validate its schema
//! - Append rows with per-row CRC32 checksums
//! - Cut off a torn or corrupt tail left by a crash
//! - Read rows back for inspection
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Header                                                   │
//! │   Magic: "EVLG" (4) | Version: u16 (2) | SchemaLen (4)   │
//! │   Schema: bincode {table, columns} | SchemaCRC: u32 (4)  │
//! ├──────────────────────────────────────────────────────────┤
//! │ Row 1                                                    │
//! │ ┌─────────┬─────────┬──────────────────────────────────┐ │
//! │ │ Len (4) │ CRC (4) │ bincode(LogRow)                  │ │
//! │ └─────────┴─────────┴──────────────────────────────────┘ │
//! ├──────────────────────────────────────────────────────────┤
//! │ Row 2 ...                                                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! `time` and `t_fact` are Unix milliseconds (UTC). `data` holds the compact
//! JSON text of the payload.

mod reader;
mod writer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entry::LogEntry;
use crate::error::Result;
use crate::segment::Params;

pub use reader::{ScanResult, SegmentReader};
pub use writer::{SegmentStore, StoreOptions};

// =============================================================================
// Shared Constants (used by writer and reader)
// =============================================================================

/// Magic bytes identifying a segment file
pub(crate) const MAGIC: &[u8; 4] = b"EVLG";

/// Current segment format version
pub(crate) const VERSION: u16 = 1;

/// Fixed part of the header before the schema: Magic (4) + Version (2) + SchemaLen (4)
pub(crate) const HEADER_PREFIX_SIZE: usize = 10;

/// Row frame header: Len (4) + CRC (4)
pub(crate) const ROW_HEADER_SIZE: usize = 8;

/// Frames claiming more than this are treated as corruption when reading
pub(crate) const MAX_FRAME_SIZE: u32 = 256 * 1024 * 1024;

/// Name of the single table every segment exposes
pub const TABLE_NAME: &str = "log";

/// Column names of the `log` table, in row order
pub const COLUMNS: [&str; 7] = ["series", "session", "part", "type", "data", "time", "t_fact"];

// =============================================================================
// Schema
// =============================================================================

/// Table declaration stored in every segment header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<String>,
}

impl TableSchema {
    /// The `log` table schema
    pub fn log() -> Self {
        Self {
            table: TABLE_NAME.to_string(),
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

// =============================================================================
// Row
// =============================================================================

/// One persisted row of the `log` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRow {
    pub series: String,
    pub session: u32,
    pub part: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: String,
    /// Write-time, assigned by the store
    pub time: i64,
    /// Fact-time, supplied by the producing stream
    pub t_fact: i64,
}

impl LogRow {
    pub(crate) fn new(params: &Params, entry: &LogEntry, written_at: DateTime<Utc>) -> Self {
        Self {
            series: params.series().to_string(),
            session: params.session(),
            part: params.part(),
            kind: entry.kind.clone(),
            data: entry.data_text(),
            time: written_at.timestamp_millis(),
            t_fact: entry.fact_time.timestamp_millis(),
        }
    }

    /// Parse the `data` column back into the original payload
    pub fn decoded_data(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.data)?)
    }

    /// Write-time as a UTC timestamp
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.time)
    }

    /// Fact-time as a UTC timestamp
    pub fn fact_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.t_fact)
    }
}
