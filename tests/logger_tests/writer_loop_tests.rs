//! Tests for the writer loop state machine
//!
//! These tests drive `WriterLoop::run` directly on the calling thread.
//!
//! These tests verify:
//! - INIT opens the discovered segment
//! - Entries land in one segment, in arrival order
//! - A failed append drops only that entry
//! - Rotation closes the old part and opens part + 1
//! - Shutdown closes the store without consuming buffered entries
//! - A failed rotation open aborts the loop

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crossbeam::channel;
use evlog::segment;
use evlog::stream::{self, Multiplexer};
use evlog::writer::{State, WriterLoop};
use evlog::{Config, EvlogError, LogRow, SegmentReader, SyncStrategy};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_config(interval: Duration) -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .dirname(temp_dir.path())
        .rotation_interval(interval)
        .sync_strategy(SyncStrategy::EveryWrite)
        .max_row_bytes(512)
        .build();
    (temp_dir, config)
}

fn read_rows(path: &Path) -> Vec<LogRow> {
    SegmentReader::read_all(path).unwrap()
}

fn segment_paths(dir: &Path) -> Vec<PathBuf> {
    segment::list(dir)
        .unwrap()
        .into_iter()
        .map(|p| p.path())
        .collect()
}

// =============================================================================
// INIT / RUNNING Tests
// =============================================================================

#[test]
fn test_init_opens_first_segment() {
    let (_temp, config) = setup_config(Duration::from_secs(3600));

    let state = State::init(&config).unwrap();

    assert_eq!(state.params().session(), 1);
    assert_eq!(state.params().part(), 1);
    assert!(state.params().path().exists());
}

#[test]
fn test_init_continues_with_new_session() {
    let (_temp, config) = setup_config(Duration::from_secs(3600));

    let first = State::init(&config).unwrap().params().clone();
    let second = State::init(&config).unwrap().params().clone();

    assert_eq!(second.series(), first.series());
    assert_eq!(second.session(), first.session() + 1);
    assert_eq!(second.part(), 1);
}

#[test]
fn test_entries_land_in_one_segment_in_order() {
    let (_temp, config) = setup_config(Duration::from_secs(3600));
    let (a, source) = stream::bounded::<u32>("A", 100);
    let (shutdown, shutdown_rx) = channel::bounded::<()>(0);

    for i in 0..25 {
        a.push(i).unwrap();
    }
    drop(a);

    let state = State::init(&config).unwrap();
    let path = state.params().path();
    let mux = Multiplexer::new([("A", source)], shutdown_rx);
    let stats = WriterLoop::new(config.clone(), mux).run(state).unwrap();
    drop(shutdown);

    assert_eq!(stats.entries_written, 25);
    assert_eq!(stats.rotations, 0);
    assert_eq!(segment_paths(&config.dirname), vec![path.clone()]);

    let data: Vec<_> = read_rows(&path)
        .iter()
        .map(|r| r.decoded_data().unwrap())
        .collect();
    let expected: Vec<_> = (0..25).map(|i| json!(i)).collect();
    assert_eq!(data, expected);
}

#[test]
fn test_failed_append_drops_only_that_entry() {
    let (_temp, config) = setup_config(Duration::from_secs(3600));
    let (a, source) = stream::bounded::<String>("A", 10);
    let (_shutdown, shutdown_rx) = channel::bounded::<()>(0);

    a.push("x".repeat(4096)).unwrap();
    a.push("ok".to_string()).unwrap();
    drop(a);

    let state = State::init(&config).unwrap();
    let path = state.params().path();
    let mux = Multiplexer::new([("A", source)], shutdown_rx);
    let stats = WriterLoop::new(config, mux).run(state).unwrap();

    assert_eq!(stats.entries_written, 1);
    assert_eq!(stats.entries_dropped, 1);

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].decoded_data().unwrap(), json!("ok"));
}

// =============================================================================
// ROTATING Tests
// =============================================================================

#[test]
fn test_rotation_bumps_part() {
    let (_temp, config) = setup_config(Duration::from_millis(150));
    let (a, source) = stream::bounded::<&str>("A", 10);
    let (shutdown, shutdown_rx) = channel::bounded::<()>(0);

    let state = State::init(&config).unwrap();
    let first = state.params().clone();
    let mux = Multiplexer::new([("A", source)], shutdown_rx);
    let writer = WriterLoop::new(config.clone(), mux);
    let handle = thread::spawn(move || writer.run(state));

    a.push("before").unwrap();

    let second = first.next_part().unwrap();
    let mut waited = 0;
    while !second.path().exists() {
        assert!(waited < 5000, "rotation did not happen");
        thread::sleep(Duration::from_millis(10));
        waited += 10;
    }

    // The old part is closed and readable before the new one takes writes
    let old_rows = read_rows(&first.path());
    assert_eq!(old_rows.len(), 1);
    assert_eq!(old_rows[0].decoded_data().unwrap(), json!("before"));

    a.push("after").unwrap();
    drop(a);
    let stats = handle.join().unwrap().unwrap();
    drop(shutdown);

    assert!(stats.rotations >= 1);
    let last = stats.last_params.unwrap();
    assert_eq!(last.series(), first.series());
    assert_eq!(last.session(), first.session());
    assert_eq!(last.part(), first.part() + stats.rotations as u32);

    let after: Vec<_> = segment_paths(&config.dirname)
        .iter()
        .skip(1)
        .flat_map(|p| read_rows(p))
        .collect();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].decoded_data().unwrap(), json!("after"));
    assert!(after[0].part >= second.part());
}

#[test]
fn test_failed_rotation_aborts_loop() {
    let (_temp, config) = setup_config(Duration::from_millis(50));
    let (_a, source) = stream::bounded::<u32>("A", 10);
    let (_shutdown, shutdown_rx) = channel::bounded::<()>(0);

    let state = State::init(&config).unwrap();

    // A directory squatting on the next part's filename makes its open fail
    fs::create_dir(state.params().next_part().unwrap().path()).unwrap();

    let mux = Multiplexer::new([("A", source)], shutdown_rx);
    let result = WriterLoop::new(config, mux).run(state);

    assert!(matches!(result, Err(EvlogError::StoreOpen { .. })));
}

// =============================================================================
// CLOSING Tests
// =============================================================================

#[test]
fn test_shutdown_skips_buffered_entries() {
    let (_temp, config) = setup_config(Duration::from_secs(3600));
    let (a, source) = stream::bounded::<u32>("A", 10);
    let (shutdown, shutdown_rx) = channel::bounded::<()>(0);

    a.push(1).unwrap();
    a.push(2).unwrap();
    drop(shutdown);

    let state = State::init(&config).unwrap();
    let path = state.params().path();
    let mux = Multiplexer::new([("A", source)], shutdown_rx);
    let stats = WriterLoop::new(config, mux).run(state).unwrap();

    assert_eq!(stats.entries_written, 0);
    assert!(read_rows(&path).is_empty());
    assert!(a.push(3).is_err());
}
