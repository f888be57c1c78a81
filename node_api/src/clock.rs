//! Time source

use core_types::Instant;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time
pub trait Clock {
    /// Returns the current time
    fn now(&self) -> Instant;
}

/// Wall-clock time source
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Instant::from_nanos(nanos)
    }
}
