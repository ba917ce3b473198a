//! Logger
//!
//! Lifecycle wrapper: wires the named sources into a multiplexer and runs the
//! writer loop on its own thread.
//!
//! ## Concurrency Model: Single Writer
//!
//! - Producers push into their own bounded buffers from any thread
//! - Exactly one writer thread opens, appends to and closes segments
//! - `stop()` closes every source; entries still buffered are not written

use std::fs;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{EvlogError, Result};
use crate::stream::{Multiplexer, Source};
use crate::writer::{State, WriterLoop, WriterStats};

/// A running writer thread
struct Running {
    /// Dropped to close every source
    shutdown: Sender<()>,
    handle: JoinHandle<Result<WriterStats>>,
}

/// Durable event sink over time-rotated segment files
pub struct Logger {
    /// Logger configuration
    config: Config,

    /// Named sources, handed to the writer on start
    sources: Mutex<Option<Vec<(String, Source)>>>,

    /// Writer thread while started
    running: Mutex<Option<Running>>,
}

impl Logger {
    /// Create a logger over a mapping from stream name to source
    ///
    /// Each name must match the key its source was created with, since that
    /// key is what lands in the `type` column; `start()` rejects a mismatch.
    pub fn new<I, S>(config: Config, sources: I) -> Self
    where
        I: IntoIterator<Item = (S, Source)>,
        S: Into<String>,
    {
        let sources = sources
            .into_iter()
            .map(|(name, source)| (name.into(), source))
            .collect();

        Self {
            config,
            sources: Mutex::new(Some(sources)),
            running: Mutex::new(None),
        }
    }

    /// Open the first segment and launch the writer thread
    ///
    /// Startup:
    /// 1. Validate config and stream names, create the segment directory
    /// 2. Discover the next segment and open it (failures returned here)
    /// 3. Spawn the writer loop
    pub fn start(&self) -> Result<()> {
        let mut running = self.running.lock();
        let mut sources = self.sources.lock();
        if running.is_some() || sources.is_none() {
            return Err(EvlogError::AlreadyStarted);
        }

        self.config.validate()?;
        if let Some((name, source)) = sources
            .iter()
            .flatten()
            .find(|(name, source)| name.as_str() != source.key())
        {
            return Err(EvlogError::Config(format!(
                "stream {:?} is mapped to a source stamping {:?}",
                name,
                source.key()
            )));
        }
        fs::create_dir_all(&self.config.dirname).map_err(|source| EvlogError::Discovery {
            dir: self.config.dirname.clone(),
            source,
        })?;

        let state = State::init(&self.config)?;

        let sources = sources.take().unwrap_or_default();
        tracing::info!(
            "Logging {} streams to {}",
            sources.len(),
            self.config.dirname.display()
        );

        let (shutdown, shutdown_rx) = channel::bounded(0);
        let mux = Multiplexer::new(sources, shutdown_rx);
        let writer = WriterLoop::new(self.config.clone(), mux);

        let handle = thread::Builder::new()
            .name("evlog-writer".to_string())
            .spawn(move || writer.run(state))?;

        *running = Some(Running { shutdown, handle });
        Ok(())
    }

    /// Close every source and wait for the writer to reach CLOSED
    ///
    /// Returns the writer's counters, or the error that aborted it.
    pub fn stop(&self) -> Result<WriterStats> {
        let Running { shutdown, handle } = self.running.lock().take().ok_or(EvlogError::NotStarted)?;

        drop(shutdown);
        let stats = handle.join().map_err(|_| EvlogError::WriterPanicked)??;

        tracing::info!("Logger stopped");
        Ok(stats)
    }

    /// Wait for the writer to finish on its own, without closing any source
    ///
    /// The writer finishes once every producer has been dropped and the
    /// buffered entries are drained.
    pub fn join(&self) -> Result<WriterStats> {
        let Running { shutdown, handle } = self.running.lock().take().ok_or(EvlogError::NotStarted)?;

        let stats = handle.join().map_err(|_| EvlogError::WriterPanicked)?;
        drop(shutdown);

        tracing::info!("Logger drained");
        stats
    }

    /// Whether the writer thread is alive
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Some(Running { shutdown, handle }) = self.running.get_mut().take() {
            drop(shutdown);
            if let Ok(Err(e)) = handle.join() {
                tracing::warn!("Writer ended with error: {}", e);
            }
        }
    }
}
