//! Tests for segment discovery
//!
//! These tests verify:
//! - Listing ignores files that do not match the grammar
//! - Listing orders segments by series
//! - `next()` starts a new series in an empty directory
//! - `next()` bumps the session of the last segment and resets the part
//! - Sessions past 9999 still order numerically
//! - Exhausted counters are an error, not a wrap-around
//! - An unreadable directory is a discovery error

use std::fs;
use std::path::{Path, PathBuf};

use evlog::segment::{self, today_series, Params};
use evlog::EvlogError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"").unwrap();
}

fn touch_segment(dir: &Path, series: &str, session: u32, part: u32) {
    let params = Params::new(dir, series, session, part).unwrap();
    fs::write(params.path(), b"").unwrap();
}

// =============================================================================
// List Tests
// =============================================================================

#[test]
fn test_list_empty_directory() {
    let (_temp, dir) = setup_temp_dir();
    assert!(segment::list(&dir).unwrap().is_empty());
}

#[test]
fn test_list_ignores_malformed_names() {
    let (_temp, dir) = setup_temp_dir();
    touch(&dir, "README.md");
    touch(&dir, "log-series20261019-session1-part1.db");
    touch(&dir, "log-series20261019-session0001-part0001.db-journal");
    touch_segment(&dir, "20261019", 1, 1);

    let segments = segment::list(&dir).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].session(), 1);
    assert_eq!(segments[0].dirname(), dir.as_path());
}

#[test]
fn test_list_ignores_directories() {
    let (_temp, dir) = setup_temp_dir();
    fs::create_dir(dir.join("log-series20261019-session0005-part0001.db")).unwrap();
    touch_segment(&dir, "20261019", 1, 1);

    let segments = segment::list(&dir).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].session(), 1);
}

#[test]
fn test_list_sorted_by_series() {
    let (_temp, dir) = setup_temp_dir();
    touch_segment(&dir, "20261019", 1, 1);
    touch_segment(&dir, "20250101", 7, 3);
    touch_segment(&dir, "20260501", 2, 2);

    let series: Vec<String> = segment::list(&dir)
        .unwrap()
        .iter()
        .map(|p| p.series().to_string())
        .collect();

    assert_eq!(series, vec!["20250101", "20260501", "20261019"]);
}

#[test]
fn test_list_unreadable_directory_fails() {
    let (_temp, dir) = setup_temp_dir();
    let missing = dir.join("does_not_exist");

    let result = segment::list(&missing);
    assert!(matches!(result, Err(EvlogError::Discovery { .. })));
}

// =============================================================================
// Next Tests
// =============================================================================

#[test]
fn test_next_in_empty_directory_starts_today() {
    let (_temp, dir) = setup_temp_dir();

    let params = segment::next(&dir).unwrap();

    assert_eq!(params.series(), today_series());
    assert_eq!(params.series().len(), 8);
    assert!(params.series().bytes().all(|b| b.is_ascii_digit()));
    assert_eq!(params.session(), 1);
    assert_eq!(params.part(), 1);
    assert_eq!(params.dirname(), dir.as_path());
}

#[test]
fn test_next_bumps_session_regardless_of_part() {
    let (_temp, dir) = setup_temp_dir();
    touch_segment(&dir, "20240101", 3, 1);
    touch_segment(&dir, "20240101", 3, 2);
    touch_segment(&dir, "20240101", 3, 17);

    let params = segment::next(&dir).unwrap();

    assert_eq!(params.series(), "20240101");
    assert_eq!(params.session(), 4);
    assert_eq!(params.part(), 1);
}

#[test]
fn test_next_keeps_old_series_even_when_date_changed() {
    let (_temp, dir) = setup_temp_dir();
    touch_segment(&dir, "19700101", 1, 1);

    let params = segment::next(&dir).unwrap();

    assert_eq!(params.series(), "19700101");
    assert_eq!(params.session(), 2);
}

#[test]
fn test_next_follows_last_series() {
    let (_temp, dir) = setup_temp_dir();
    touch_segment(&dir, "20240101", 9, 4);
    touch_segment(&dir, "20240102", 2, 1);

    let params = segment::next(&dir).unwrap();

    assert_eq!(params.series(), "20240102");
    assert_eq!(params.session(), 3);
    assert_eq!(params.part(), 1);
}

#[test]
fn test_next_within_series_uses_highest_session() {
    let (_temp, dir) = setup_temp_dir();
    touch_segment(&dir, "20240101", 2, 1);
    touch_segment(&dir, "20240101", 1, 5);
    touch_segment(&dir, "20240101", 3, 1);

    let params = segment::next(&dir).unwrap();

    assert_eq!(params.session(), 4);
}

#[test]
fn test_next_is_not_on_disk() {
    let (_temp, dir) = setup_temp_dir();
    touch_segment(&dir, "20240101", 1, 1);
    touch_segment(&dir, "20240101", 1, 2);

    let params = segment::next(&dir).unwrap();

    assert!(!params.path().exists());
}

#[test]
fn test_next_past_four_digit_sessions() {
    let (_temp, dir) = setup_temp_dir();
    touch_segment(&dir, "20240101", 9999, 1);
    touch_segment(&dir, "20240101", 10000, 1);

    let params = segment::next(&dir).unwrap();

    assert_eq!(params.session(), 10001);
    assert!(!params.path().exists());
}

#[test]
fn test_list_orders_sessions_numerically() {
    let (_temp, dir) = setup_temp_dir();
    touch_segment(&dir, "20240101", 10000, 1);
    touch_segment(&dir, "20240101", 9999, 2);
    touch_segment(&dir, "20240101", 9999, 1);

    let ids: Vec<(u32, u32)> = segment::list(&dir)
        .unwrap()
        .iter()
        .map(|p| (p.session(), p.part()))
        .collect();

    assert_eq!(ids, vec![(9999, 1), (9999, 2), (10000, 1)]);
}

#[test]
fn test_next_with_exhausted_session_fails() {
    let (_temp, dir) = setup_temp_dir();
    touch(&dir, "log-seriesX-session4294967295-part0001.db");

    let result = segment::next(&dir);
    assert!(matches!(result, Err(EvlogError::InvalidParams(_))));
}
