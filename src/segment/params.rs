//! Segment Params
//!
//! `(series, session, part)` plus the directory, and the filename grammar.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{EvlogError, Result};

/// Filename prefix shared by every segment
pub const FILE_PREFIX: &str = "log-series";

/// Filename extension shared by every segment
pub const FILE_EXTENSION: &str = ".db";

const SESSION_TAG: &str = "-session";
const PART_TAG: &str = "-part";

/// Minimum width of the zero-padded numeric fields
const NUMBER_WIDTH: usize = 4;

/// Identifies one segment file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Params {
    dirname: PathBuf,
    series: String,
    session: u32,
    part: u32,
}

impl Params {
    /// Build params, rejecting a series that would break the filename grammar
    pub fn new(
        dirname: impl Into<PathBuf>,
        series: impl Into<String>,
        session: u32,
        part: u32,
    ) -> Result<Self> {
        let series = series.into();
        if !is_valid_series(&series) {
            return Err(EvlogError::InvalidParams(format!(
                "series {:?} must be non-empty and free of '-' and path separators",
                series
            )));
        }
        Ok(Self {
            dirname: dirname.into(),
            series,
            session,
            part,
        })
    }

    /// Parse a segment path back into params
    ///
    /// Returns `None` for anything that does not match the grammar.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let dirname = path.parent().unwrap_or_else(|| Path::new(""));
        let (series, session, part) = parse_file_name(name)?;
        Some(Self {
            dirname: dirname.to_path_buf(),
            series,
            session,
            part,
        })
    }

    pub fn dirname(&self) -> &Path {
        &self.dirname
    }

    pub fn series(&self) -> &str {
        &self.series
    }

    pub fn session(&self) -> u32 {
        self.session
    }

    pub fn part(&self) -> u32 {
        self.part
    }

    /// Filename of this segment (no directory)
    pub fn file_name(&self) -> String {
        format!(
            "{}{}{}{:04}{}{:04}{}",
            FILE_PREFIX, self.series, SESSION_TAG, self.session, PART_TAG, self.part, FILE_EXTENSION
        )
    }

    /// Full path of this segment
    pub fn path(&self) -> PathBuf {
        self.dirname.join(self.file_name())
    }

    /// Params of the segment that follows this one after a rotation
    pub fn next_part(&self) -> Result<Self> {
        let part = self.part.checked_add(1).ok_or_else(|| {
            EvlogError::InvalidParams(format!("part counter exhausted at {}", self))
        })?;
        Ok(Self {
            part,
            ..self.clone()
        })
    }

    /// Params of the first segment of the session after this one
    pub fn next_session(&self) -> Result<Self> {
        let session = self.session.checked_add(1).ok_or_else(|| {
            EvlogError::InvalidParams(format!("session counter exhausted at {}", self))
        })?;
        Ok(Self {
            session,
            part: 1,
            ..self.clone()
        })
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "series={} session={} part={}",
            self.series, self.session, self.part
        )
    }
}

/// Parse a bare segment filename into `(series, session, part)`
/// "log-series20261019-session0003-part0012.db" → Some(("20261019", 3, 12))
pub fn parse_file_name(name: &str) -> Option<(String, u32, u32)> {
    let body = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_EXTENSION)?;
    let (rest, part) = body.rsplit_once(PART_TAG)?;
    let (series, session) = rest.rsplit_once(SESSION_TAG)?;

    if !is_valid_series(series) {
        return None;
    }

    Some((series.to_string(), parse_number(session)?, parse_number(part)?))
}

fn parse_number(digits: &str) -> Option<u32> {
    if digits.len() < NUMBER_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn is_valid_series(series: &str) -> bool {
    !series.is_empty() && !series.contains(['-', '/', '\\'])
}
