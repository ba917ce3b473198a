//! Writer Loop
//!
//! The single task that owns the active segment and serializes every
//! open, append and close.
//!
//! ## States
//! ```text
//! INIT ──▶ RUNNING ◀──▶ ROTATING
//!             │
//!             ▼
//!          CLOSING ──▶ CLOSED
//! ```
//!
//! ## Failure handling
//! - store open fails (startup or rotation) → error returned, loop aborts
//! - append fails → logged, entry dropped, loop continues
//! - close fails → logged at debug, ignored

use crate::config::Config;
use crate::entry::LogEntry;
use crate::error::Result;
use crate::scheduler::RotationScheduler;
use crate::segment::{self, Params};
use crate::store::{SegmentStore, StoreOptions};
use crate::stream::{Event, Multiplexer};

/// Target of the human-readable echo of every accepted entry
pub const ECHO_TARGET: &str = "evlog::echo";

/// The loop's working set: active params, open store, rotation deadline
///
/// Replaced wholesale on rotation; the old store is closed first.
pub struct State {
    params: Params,
    store: SegmentStore,
    scheduler: RotationScheduler,
}

impl State {
    /// INIT: discover the next segment, open it, arm rotation
    pub fn init(config: &Config) -> Result<Self> {
        let params = segment::next(&config.dirname)?;
        Self::open(params, config)
    }

    /// Open the segment for `params` and arm a fresh scheduler
    pub fn open(params: Params, config: &Config) -> Result<Self> {
        let store = SegmentStore::open(&params, StoreOptions::from(config))?;
        tracing::info!("Writing segment {} ({})", store.path().display(), params);

        Ok(Self {
            params,
            store,
            scheduler: RotationScheduler::arm(config.rotation_interval),
        })
    }

    /// Params of the active segment
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// ROTATING: close this segment, then open the next part
    fn rotate(self, config: &Config) -> Result<Self> {
        let next = match self.params.next_part() {
            Ok(next) => next,
            Err(e) => {
                self.close();
                return Err(e);
            }
        };
        tracing::info!("Rotating {} → part {}", self.params, next.part());
        self.close();
        Self::open(next, config)
    }

    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        self.store.append(entry, &self.params)
    }

    /// Close the store, ignoring failures
    fn close(self) {
        let path = self.store.path().to_path_buf();
        if let Err(e) = self.store.close() {
            tracing::debug!("Ignoring close failure for {}: {}", path.display(), e);
        }
    }
}

/// Counters reported when the loop ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Entries persisted
    pub entries_written: u64,
    /// Entries whose append failed
    pub entries_dropped: u64,
    /// Completed rotations
    pub rotations: u64,
    /// Params of the segment open when the loop closed
    pub last_params: Option<Params>,
}

/// Consumes the multiplexer into the active segment until shutdown
pub struct WriterLoop {
    config: Config,
    mux: Multiplexer,
}

impl WriterLoop {
    pub fn new(config: Config, mux: Multiplexer) -> Self {
        Self { config, mux }
    }

    /// RUNNING until the multiplexer closes, then CLOSING → CLOSED
    ///
    /// Each append completes before the next event is taken, so a slow
    /// store stalls the streams rather than dropping their entries.
    pub fn run(mut self, mut state: State) -> Result<WriterStats> {
        let mut stats = WriterStats::default();

        loop {
            match self.mux.next(&state.scheduler) {
                Event::Entry(entry) => {
                    tracing::info!(
                        target: ECHO_TARGET,
                        "[LOG {} {}] {}",
                        state.params.session(),
                        entry.kind,
                        entry.data
                    );

                    match state.append(&entry) {
                        Ok(()) => stats.entries_written += 1,
                        Err(e) => {
                            tracing::warn!("Dropping {} entry: {}", entry.kind, e);
                            stats.entries_dropped += 1;
                        }
                    }
                }
                Event::Rotate => {
                    state = state.rotate(&self.config)?;
                    stats.rotations += 1;
                }
                Event::Closed => {
                    tracing::info!(
                        "Closing segment {} after {} entries ({} dropped, {} rotations)",
                        state.params,
                        stats.entries_written,
                        stats.entries_dropped,
                        stats.rotations
                    );
                    stats.last_params = Some(state.params.clone());
                    state.close();
                    return Ok(stats);
                }
            }
        }
    }
}
