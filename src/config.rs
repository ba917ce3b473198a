//! Configuration for evlog
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{EvlogError, Result};
use crate::store::MAX_FRAME_SIZE;

/// Main configuration for a logger instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the segment files
    /// Internal structure:
    ///   {dirname}/
    ///     ├── log-series20261019-session0001-part0001.db
    ///     ├── log-series20261019-session0001-part0002.db
    ///     └── log-series20261019-session0002-part0001.db
    pub dirname: PathBuf,

    /// Sync strategy: how often to fsync the active segment
    pub sync_strategy: SyncStrategy,

    /// Encoded rows larger than this are rejected by the store
    pub max_row_bytes: usize,

    // -------------------------------------------------------------------------
    // Rotation Configuration
    // -------------------------------------------------------------------------
    /// Time after which the active segment is closed and the next part opened
    pub rotation_interval: Duration,

    // -------------------------------------------------------------------------
    // Stream Configuration
    // -------------------------------------------------------------------------
    /// Capacity of each input stream's buffer; producers block when it is full
    pub buffer_capacity: usize,
}

/// Segment sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every row (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced rows (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dirname: PathBuf::from("./evlog_data"),
            sync_strategy: SyncStrategy::EveryNEntries { count: 100 },
            max_row_bytes: 16 * 1024 * 1024, // 16 MB
            rotation_interval: Duration::from_secs(60 * 60),
            buffer_capacity: 100,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that every knob holds a usable value
    pub fn validate(&self) -> Result<()> {
        if self.rotation_interval.is_zero() {
            return Err(EvlogError::Config(
                "rotation_interval must be greater than zero".to_string(),
            ));
        }
        if self.buffer_capacity == 0 {
            return Err(EvlogError::Config(
                "buffer_capacity must be greater than zero".to_string(),
            ));
        }
        if self.max_row_bytes == 0 {
            return Err(EvlogError::Config(
                "max_row_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_row_bytes > MAX_FRAME_SIZE as usize {
            return Err(EvlogError::Config(format!(
                "max_row_bytes must not exceed {} bytes",
                MAX_FRAME_SIZE
            )));
        }
        if let SyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(EvlogError::Config(
                "sync count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the segment directory
    pub fn dirname(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dirname = path.into();
        self
    }

    /// Set the segment sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the maximum encoded row size (in bytes)
    pub fn max_row_bytes(mut self, size: usize) -> Self {
        self.config.max_row_bytes = size;
        self
    }

    /// Set the rotation interval
    pub fn rotation_interval(mut self, interval: Duration) -> Self {
        self.config.rotation_interval = interval;
        self
    }

    /// Set the per-stream buffer capacity
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
