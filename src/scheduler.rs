//! Rotation Scheduler
//!
//! Fires once, a fixed interval after it was armed. The writer loop arms a
//! fresh scheduler every time it opens a segment.

use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver};

/// One-shot rotation deadline
pub struct RotationScheduler {
    interval: Duration,
    deadline: Option<Instant>,
    /// Delivers a single message at the deadline
    timer: Receiver<Instant>,
}

impl RotationScheduler {
    /// Arm a scheduler that fires `interval` from now
    ///
    /// An interval too large to represent never fires.
    pub fn arm(interval: Duration) -> Self {
        let deadline = Instant::now().checked_add(interval);
        let timer = match deadline {
            Some(at) => channel::at(at),
            None => channel::never(),
        };

        Self {
            interval,
            deadline,
            timer,
        }
    }

    /// Whether the deadline has passed
    pub fn is_due(&self) -> bool {
        self.deadline.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left until the deadline (zero once due)
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub(crate) fn timer(&self) -> &Receiver<Instant> {
        &self.timer
    }
}
