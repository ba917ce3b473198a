//! Segment Module
//!
//! Identifies segment files and finds the next one to write.
//!
//! ## Responsibilities
//! - Format and parse segment filenames
//! - Discover existing segments in a directory
//! - Compute the identifier of the next segment for a fresh run
//!
//! ## Filename Grammar
//! ```text
//! <dirname>/log-series<series>-session<session:04>-part<part:04>.db
//!
//!   log-series20261019-session0003-part0012.db
//!             └──┬───┘        └┬─┘     └┬─┘
//!             series      session    part
//! ```
//!
//! `series` is opaque but may not contain `-` or path separators; `session`
//! and `part` are zero-padded to at least four digits.

mod discovery;
mod params;

pub use discovery::{list, next, today_series};
pub use params::{parse_file_name, Params, FILE_EXTENSION, FILE_PREFIX};
