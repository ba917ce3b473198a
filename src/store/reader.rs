//! Segment Reader
//!
//! Reads the header and rows of a segment file. Reading stops at the first
//! torn or corrupt frame; everything before it is returned.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use crate::error::{EvlogError, Result};

use super::{LogRow, TableSchema, HEADER_PREFIX_SIZE, MAGIC, MAX_FRAME_SIZE, ROW_HEADER_SIZE, VERSION};

/// Outcome of scanning the rows of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanResult {
    /// Number of intact rows
    pub rows: u64,

    /// Byte offset just past the last intact row
    pub valid_len: u64,

    /// Whether bytes after `valid_len` were torn or corrupt
    pub corrupted_tail: bool,
}

/// Reads rows from a segment file
pub struct SegmentReader {
    path: PathBuf,
    reader: BufReader<File>,
    schema: TableSchema,
    offset: u64,
    corrupted_tail: bool,
    finished: bool,
}

impl SegmentReader {
    /// Open a segment for reading and validate its header
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let (schema, header_len) = read_header(&mut reader)?;

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            schema,
            offset: header_len,
            corrupted_tail: false,
            finished: false,
        })
    }

    /// Read every intact row of the segment at `path`
    pub fn read_all(path: &Path) -> Result<Vec<LogRow>> {
        Self::open(path)?.into_rows()
    }

    /// Read the next row
    ///
    /// Returns `Ok(None)` at the end of the file or at the first bad frame.
    pub fn next_row(&mut self) -> Result<Option<LogRow>> {
        if self.finished {
            return Ok(None);
        }

        match read_frame(&mut self.reader)? {
            Frame::Row { row, size } => {
                self.offset += size;
                Ok(Some(row))
            }
            Frame::End => {
                self.finished = true;
                Ok(None)
            }
            Frame::Bad(reason) => {
                tracing::warn!(
                    "Corrupt tail in {} at offset {}: {}",
                    self.path.display(),
                    self.offset,
                    reason
                );
                self.finished = true;
                self.corrupted_tail = true;
                Ok(None)
            }
        }
    }

    /// Collect the remaining rows
    pub fn into_rows(mut self) -> Result<Vec<LogRow>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Schema declared in the header
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Whether reading stopped at a torn or corrupt frame
    pub fn has_corrupted_tail(&self) -> bool {
        self.corrupted_tail
    }

    /// Byte offset just past the last row read
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

// =============================================================================
// Shared Helpers (used by the store on reopen)
// =============================================================================

/// Read and validate a segment header, returning the schema and header length
pub(crate) fn read_header<R: Read>(reader: &mut R) -> Result<(TableSchema, u64)> {
    let mut prefix = [0u8; HEADER_PREFIX_SIZE];
    reader.read_exact(&mut prefix).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => EvlogError::Corruption("truncated segment header".to_string()),
        _ => EvlogError::Io(e),
    })?;

    if &prefix[0..4] != MAGIC {
        return Err(EvlogError::Corruption(format!(
            "Invalid segment magic: expected EVLG, got {:?}",
            &prefix[0..4]
        )));
    }

    let version = u16::from_le_bytes([prefix[4], prefix[5]]);
    if version != VERSION {
        return Err(EvlogError::Corruption(format!(
            "Unsupported segment version: {}",
            version
        )));
    }

    let schema_len = u32::from_le_bytes([prefix[6], prefix[7], prefix[8], prefix[9]]);
    if schema_len > MAX_FRAME_SIZE {
        return Err(EvlogError::Corruption(format!(
            "schema length {} out of range",
            schema_len
        )));
    }

    let mut schema_bytes = vec![0u8; schema_len as usize + 4];
    reader.read_exact(&mut schema_bytes).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => EvlogError::Corruption("truncated segment schema".to_string()),
        _ => EvlogError::Io(e),
    })?;

    let (schema_bytes, crc_bytes) = schema_bytes.split_at(schema_len as usize);
    let stored_crc = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    if crc32fast::hash(schema_bytes) != stored_crc {
        return Err(EvlogError::Corruption("schema checksum mismatch".to_string()));
    }

    let schema: TableSchema = bincode::deserialize(schema_bytes)?;
    let header_len = (HEADER_PREFIX_SIZE + schema_len as usize + 4) as u64;

    Ok((schema, header_len))
}

/// Scan the rows following a header, counting intact rows
///
/// `reader` must be positioned just past the header, which is `start` bytes long.
pub(crate) fn scan_rows<R: Read>(reader: R, start: u64) -> Result<ScanResult> {
    let mut reader = BufReader::new(reader);
    let mut result = ScanResult {
        rows: 0,
        valid_len: start,
        corrupted_tail: false,
    };

    loop {
        match read_frame(&mut reader)? {
            Frame::Row { size, .. } => {
                result.rows += 1;
                result.valid_len += size;
            }
            Frame::End => return Ok(result),
            Frame::Bad(_) => {
                result.corrupted_tail = true;
                return Ok(result);
            }
        }
    }
}

enum Frame {
    /// An intact row and its frame size in bytes
    Row { row: LogRow, size: u64 },
    /// Clean end of file at a frame boundary
    End,
    /// Torn or corrupt frame
    Bad(String),
}

fn read_frame<R: Read>(reader: &mut R) -> Result<Frame> {
    let mut header = [0u8; ROW_HEADER_SIZE];
    let filled = fill(reader, &mut header)?;
    if filled == 0 {
        return Ok(Frame::End);
    }
    if filled < ROW_HEADER_SIZE {
        return Ok(Frame::Bad(format!("torn frame header ({} bytes)", filled)));
    }

    let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if len > MAX_FRAME_SIZE {
        return Ok(Frame::Bad(format!("frame length {} out of range", len)));
    }

    let mut payload = vec![0u8; len as usize];
    let filled = fill(reader, &mut payload)?;
    if filled < payload.len() {
        return Ok(Frame::Bad(format!(
            "torn frame payload ({} of {} bytes)",
            filled, len
        )));
    }

    if crc32fast::hash(&payload) != crc {
        return Ok(Frame::Bad("checksum mismatch".to_string()));
    }

    match bincode::deserialize::<LogRow>(&payload) {
        Ok(row) => Ok(Frame::Row {
            row,
            size: (ROW_HEADER_SIZE + payload.len()) as u64,
        }),
        Err(e) => Ok(Frame::Bad(format!("undecodable row: {}", e))),
    }
}

/// Read until `buf` is full or EOF, returning the number of bytes read
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
