//! A simple start-instant-plus-duration timer, matching the contract the
//! election and coloring protocols depend on: `extend` grows the duration
//! without moving the start, `reset` moves the start to now.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Timeout {
    start: Instant,
    duration: Duration,
}

impl Timeout {
    pub fn new(duration: Duration) -> Self {
        Self {
            start: Instant::now(),
            duration,
        }
    }

    pub fn timed_out(&self) -> bool {
        self.start.elapsed() > self.duration
    }

    /// Adds `additional` to the duration. Does not move the start instant.
    pub fn extend(&mut self, additional: Duration) {
        self.duration += additional;
    }

    /// Moves the start instant to now. Does not reset an extended duration
    /// back to its original value.
    pub fn reset(&mut self) {
        self.start = Instant::now();
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.start.elapsed())
    }
}
