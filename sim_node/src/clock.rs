//! # Simulated Clock
//!
//! Virtual time only moves when a test tells it to, which makes restart
//! windows reproducible.
//!
//! ```
//! use core_types::Duration;
//! use node_api::Clock;
//! use sim_node::SimClock;
//!
//! let clock = SimClock::new();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now().as_nanos(), 5_000_000_000);
//! ```

use core_types::{Duration, Instant};
use node_api::Clock;
use std::cell::Cell;

/// Controllable clock starting at time zero
#[derive(Debug, Clone)]
pub struct SimClock {
    now: Cell<Instant>,
}

impl SimClock {
    /// Creates a clock at time zero
    pub fn new() -> Self {
        Self::starting_at(Instant::from_nanos(0))
    }

    /// Creates a clock at `start`
    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Moves time forward by `by`
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jumps to `at`
    pub fn set(&self, at: Instant) {
        self.now.set(at);
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
