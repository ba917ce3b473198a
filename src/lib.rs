//! # evlog
//!
//! A durable, crash-tolerant event log sink with:
//! - Several typed input streams merged into one ordered consumer
//! - Segment files rotated on a fixed time interval
//! - Session/part numbering that survives restarts and clock anomalies
//! - Single-writer loop serializing every durability operation
//!
//! ## Architecture Overview
//!
//! ```text
//!   Producer A      Producer B      Producer C
//!       │               │               │
//!   [buffer]        [buffer]        [buffer]      (bounded, blocking)
//!       └───────────────┼───────────────┘
//!                       ▼
//!               ┌───────────────┐     ┌───────────────────┐
//!               │  Multiplexer  │◀────│ RotationScheduler │
//!               └───────┬───────┘     └───────────────────┘
//!                       ▼
//!               ┌───────────────┐     ┌───────────────────┐
//!               │  Writer Loop  │────▶│ Segment Discovery │
//!               │ (one thread)  │     └───────────────────┘
//!               └───────┬───────┘
//!                       ▼
//!               ┌───────────────┐
//!               │ SegmentStore  │  log-series<S>-session<K>-part<P>.db
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod entry;
pub mod segment;
pub mod store;
pub mod stream;
pub mod scheduler;
pub mod writer;
pub mod logger;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EvlogError, Result};
pub use config::{Config, SyncStrategy};
pub use entry::LogEntry;
pub use segment::Params;
pub use store::{LogRow, SegmentReader, SegmentStore};
pub use stream::{Producer, Source};
pub use logger::Logger;
pub use writer::WriterStats;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of evlog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
