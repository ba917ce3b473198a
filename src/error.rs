//! Error types for evlog
//!
//! Provides a unified error type for all operations.
//!
//! The disposition of each kind is decided by the writer loop, not here:
//! discovery and store-open failures abort, append failures drop the entry,
//! close failures are ignored.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using EvlogError
pub type Result<T> = std::result::Result<T, EvlogError>;

/// Unified error type for evlog operations
#[derive(Debug, Error)]
pub enum EvlogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Segment Errors
    // -------------------------------------------------------------------------
    #[error("Cannot read segment directory {dir}: {source}")]
    Discovery {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid segment params: {0}")]
    InvalidParams(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Failed to open segment {path}: {reason}")]
    StoreOpen { path: PathBuf, reason: String },

    #[error("Append failed: {0}")]
    Append(String),

    #[error("Close failed: {0}")]
    Close(String),

    #[error("Segment corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Stream Errors
    // -------------------------------------------------------------------------
    #[error("Stream '{0}' is closed")]
    SourceClosed(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Logger already started")]
    AlreadyStarted,

    #[error("Logger not started")]
    NotStarted,

    #[error("Writer thread panicked")]
    WriterPanicked,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for EvlogError {
    fn from(e: bincode::Error) -> Self {
        EvlogError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for EvlogError {
    fn from(e: serde_json::Error) -> Self {
        EvlogError::Serialization(e.to_string())
    }
}
