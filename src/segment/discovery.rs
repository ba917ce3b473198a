//! Segment Discovery
//!
//! Scans a directory for segment files and picks the next identifier.

use std::fs;
use std::path::Path;

use chrono::Utc;

use crate::error::{EvlogError, Result};

use super::Params;

/// List the segments in `dirname`, ordered by series
///
/// Entries that do not match the filename grammar are skipped. Segments are
/// first put in `(session, part)` order, then stably sorted by series, so the
/// last entry is the newest segment of the last series.
pub fn list(dirname: &Path) -> Result<Vec<Params>> {
    let read_dir = |source: std::io::Error| EvlogError::Discovery {
        dir: dirname.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dirname).map_err(read_dir)? {
        let entry = entry.map_err(read_dir)?;
        let file_path = entry.path();

        if file_path.is_file() {
            paths.push(file_path);
        }
    }
    let mut segments: Vec<Params> = paths
        .iter()
        .filter_map(|path| Params::from_path(path))
        .collect();

    segments.sort_by_key(|p| (p.session(), p.part()));
    segments.sort_by(|a, b| a.series().cmp(b.series()));

    Ok(segments)
}

/// Compute the params a fresh run should open
///
/// Continues the last listed segment with a new session, or starts a new
/// series dated today (UTC) when the directory holds no segments at all.
pub fn next(dirname: &Path) -> Result<Params> {
    let segments = list(dirname)?;

    match segments.last() {
        Some(last) => last.next_session(),
        None => Params::new(dirname, today_series(), 1, 1),
    }
}

/// Today's UTC date as an 8-digit series label ("20261019")
pub fn today_series() -> String {
    Utc::now().format("%Y%m%d").to_string()
}
