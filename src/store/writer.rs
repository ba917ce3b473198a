//! Segment Store
//!
//! Creates or reopens one segment file and appends rows to it.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};
use chrono::Utc;

use crate::config::{Config, SyncStrategy};
use crate::entry::LogEntry;
use crate::error::{EvlogError, Result};
use crate::segment::Params;

use super::reader::{read_header, scan_rows};
use super::{LogRow, TableSchema, MAGIC, MAX_FRAME_SIZE, ROW_HEADER_SIZE, VERSION};

/// Store knobs taken from the logger config
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    pub sync_strategy: SyncStrategy,
    pub max_row_bytes: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions::from(&Config::default())
    }
}

impl From<&Config> for StoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            sync_strategy: config.sync_strategy,
            max_row_bytes: config.max_row_bytes,
        }
    }
}

/// An open segment file accepting appends
///
/// Single writer: the store does no locking of its own.
pub struct SegmentStore {
    /// Path of the backing file
    path: PathBuf,
    /// Backing file, positioned at the end
    file: File,
    options: StoreOptions,
    /// Rows in the file, including rows found on reopen
    row_count: u64,
    /// End of the last complete row
    valid_len: u64,
    /// Rows written since the last fsync
    unsynced: usize,
    /// Reused frame buffer
    frame: BytesMut,
}

impl SegmentStore {
    /// Open the segment for `params`, creating it if absent
    ///
    /// Reopening an existing segment validates its schema and cuts off a
    /// torn tail. Every failure is reported as `StoreOpen`.
    pub fn open(params: &Params, options: StoreOptions) -> Result<Self> {
        Self::open_path(&params.path(), options)
    }

    /// Open a segment by path (see [`SegmentStore::open`])
    pub fn open_path(path: &Path, options: StoreOptions) -> Result<Self> {
        Self::open_inner(path, options).map_err(|e| match e {
            e @ EvlogError::StoreOpen { .. } => e,
            other => EvlogError::StoreOpen {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        })
    }

    fn open_inner(path: &Path, options: StoreOptions) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        let file_len = file.metadata()?.len();

        let (row_count, valid_len) = if file_len == 0 {
            let header_len = write_header(&mut file)?;
            file.sync_all()?;
            (0, header_len)
        } else {
            let (schema, header_len) = read_header(&mut file)?;
            if schema != TableSchema::log() {
                return Err(EvlogError::Corruption(format!(
                    "unexpected schema: table {:?} with columns {:?}",
                    schema.table, schema.columns
                )));
            }

            let scan = scan_rows(&mut file, header_len)?;
            if scan.valid_len < file_len {
                tracing::warn!(
                    "Truncating {} bytes of torn tail from {}",
                    file_len - scan.valid_len,
                    path.display()
                );
                file.set_len(scan.valid_len)?;
                file.sync_all()?;
            }
            (scan.rows, scan.valid_len)
        };

        file.seek(SeekFrom::Start(valid_len))?;

        tracing::debug!("Opened segment {} ({} existing rows)", path.display(), row_count);

        Ok(Self {
            path: path.to_path_buf(),
            file,
            options,
            row_count,
            valid_len,
            unsynced: 0,
            frame: BytesMut::with_capacity(4096),
        })
    }

    /// Append one entry as a row of the `log` table
    ///
    /// `time` is taken from the store's clock at the moment of the call.
    /// A failed write is rolled back to the previous row boundary.
    pub fn append(&mut self, entry: &LogEntry, params: &Params) -> Result<()> {
        let row = LogRow::new(params, entry, Utc::now());
        let payload = bincode::serialize(&row).map_err(|e| EvlogError::Append(e.to_string()))?;

        if payload.len() > self.options.max_row_bytes {
            return Err(EvlogError::Append(format!(
                "row of {} bytes exceeds limit of {} bytes",
                payload.len(),
                self.options.max_row_bytes
            )));
        }
        let len = u32::try_from(payload.len())
            .ok()
            .filter(|len| *len <= MAX_FRAME_SIZE)
            .ok_or_else(|| EvlogError::Append(format!("row of {} bytes is too large", payload.len())))?;

        // Frame: [len(4)][crc(4)][payload]
        self.frame.clear();
        self.frame.reserve(ROW_HEADER_SIZE + payload.len());
        self.frame.put_u32_le(len);
        self.frame.put_u32_le(crc32fast::hash(&payload));
        self.frame.put_slice(&payload);

        if let Err(e) = self.file.write_all(&self.frame) {
            self.rollback();
            return Err(EvlogError::Append(e.to_string()));
        }

        self.valid_len += self.frame.len() as u64;
        self.row_count += 1;
        self.unsynced += 1;

        tracing::trace!("Appended {} row to {}", row.kind, self.path.display());

        let due = match self.options.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        // The row is already written; a failed sync is retried on the next due append
        if due {
            if let Err(e) = self.sync() {
                tracing::warn!("Sync failed for {}: {}", self.path.display(), e);
            }
        }

        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Sync and close the segment
    pub fn close(self) -> Result<()> {
        self.file
            .sync_all()
            .map_err(|e| EvlogError::Close(format!("{}: {}", self.path.display(), e)))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows in the segment
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Drop a partially written frame; best-effort
    fn rollback(&mut self) {
        let result = self
            .file
            .set_len(self.valid_len)
            .and_then(|_| self.file.seek(SeekFrom::Start(self.valid_len)).map(|_| ()));
        if let Err(e) = result {
            tracing::warn!("Failed to roll back {}: {}", self.path.display(), e);
        }
    }
}

/// Write the header for a new segment, returning its length
fn write_header(file: &mut File) -> Result<u64> {
    let schema = bincode::serialize(&TableSchema::log())?;

    let mut header = BytesMut::with_capacity(super::HEADER_PREFIX_SIZE + schema.len() + 4);
    header.put_slice(MAGIC);
    header.put_u16_le(VERSION);
    header.put_u32_le(schema.len() as u32);
    header.put_slice(&schema);
    header.put_u32_le(crc32fast::hash(&schema));

    file.write_all(&header)?;
    Ok(header.len() as u64)
}
