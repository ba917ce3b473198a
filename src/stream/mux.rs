//! Stream Multiplexer
//!
//! Merges every input stream, the rotation timer and the shutdown signal
//! into a single wait for the writer loop.
//!
//! ## Readiness order
//! Before blocking, every call checks in this order:
//! 1. shutdown requested, or no stream left open → `Closed`
//! 2. rotation deadline passed → `Rotate`
//! 3. otherwise block until a stream, the timer or shutdown is ready
//!
//! A stop request therefore wins over buffered entries, and a due rotation
//! is handled before the next buffered entry.

use std::time::Instant;

use crossbeam::channel::{self, Receiver, Select, TryRecvError};

use crate::entry::LogEntry;
use crate::scheduler::RotationScheduler;

use super::Source;

/// Operation indices registered ahead of the streams
const SHUTDOWN_OP: usize = 0;
const TIMER_OP: usize = 1;
const FIRST_STREAM_OP: usize = 2;

/// What the writer loop should do next
#[derive(Debug)]
pub enum Event {
    /// An entry arrived from one of the streams
    Entry(LogEntry),
    /// The rotation deadline passed
    Rotate,
    /// Shutdown was requested or every stream closed
    Closed,
}

/// Merged view over all input streams
pub struct Multiplexer {
    /// Open streams as (name, receiver)
    streams: Vec<(String, Receiver<LogEntry>)>,
    /// Disconnected (or signalled) when the logger stops
    shutdown: Receiver<()>,
    /// Set once shutdown has been observed
    stopped: bool,
    /// Timer that never fires, for waits without a rotation deadline
    idle: Receiver<Instant>,
}

impl Multiplexer {
    /// Merge the named sources; dropping every sender of `shutdown` closes them all
    pub fn new<I, S>(sources: I, shutdown: Receiver<()>) -> Self
    where
        I: IntoIterator<Item = (S, Source)>,
        S: Into<String>,
    {
        let streams = sources
            .into_iter()
            .map(|(name, source)| (name.into(), source.into_receiver()))
            .collect();

        Self {
            streams,
            shutdown,
            stopped: false,
            idle: channel::never(),
        }
    }

    /// Wait for the next entry, the rotation deadline, or closure
    pub fn next(&mut self, scheduler: &RotationScheduler) -> Event {
        self.wait(scheduler.timer(), || scheduler.is_due())
    }

    /// Wait for the next entry, ignoring rotation
    ///
    /// Returns `None` once the multiplexer is closed.
    pub fn recv(&mut self) -> Option<LogEntry> {
        let idle = self.idle.clone();
        match self.wait(&idle, || false) {
            Event::Entry(entry) => Some(entry),
            Event::Rotate | Event::Closed => None,
        }
    }

    /// Whether shutdown was requested or every stream has closed
    pub fn is_closed(&mut self) -> bool {
        if !self.stopped {
            match self.shutdown.try_recv() {
                Err(TryRecvError::Empty) => {}
                Ok(()) | Err(TryRecvError::Disconnected) => self.stopped = true,
            }
        }
        self.stopped || self.streams.is_empty()
    }

    /// Number of streams still open
    pub fn open_streams(&self) -> usize {
        self.streams.len()
    }

    fn wait(&mut self, timer: &Receiver<Instant>, due: impl Fn() -> bool) -> Event {
        loop {
            if self.is_closed() {
                return Event::Closed;
            }
            if due() {
                return Event::Rotate;
            }

            let ready = {
                let mut sel = Select::new();
                sel.recv(&self.shutdown);
                sel.recv(timer);
                for (_, rx) in &self.streams {
                    sel.recv(rx);
                }

                let oper = sel.select();
                match oper.index() {
                    SHUTDOWN_OP => {
                        let _ = oper.recv(&self.shutdown);
                        Ready::Shutdown
                    }
                    TIMER_OP => {
                        let _ = oper.recv(timer);
                        Ready::Timer
                    }
                    index => {
                        let slot = index - FIRST_STREAM_OP;
                        match oper.recv(&self.streams[slot].1) {
                            Ok(entry) => Ready::Entry(entry),
                            Err(_) => Ready::Disconnected(slot),
                        }
                    }
                }
            };

            match ready {
                Ready::Shutdown => self.stopped = true,
                Ready::Timer => return Event::Rotate,
                Ready::Entry(entry) => return Event::Entry(entry),
                Ready::Disconnected(slot) => {
                    let (name, _) = self.streams.remove(slot);
                    tracing::debug!("Stream {} closed ({} still open)", name, self.streams.len());
                }
            }
        }
    }
}

enum Ready {
    Shutdown,
    Timer,
    Entry(LogEntry),
    Disconnected(usize),
}
