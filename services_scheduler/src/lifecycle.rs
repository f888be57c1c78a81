//! Scheduler lifecycle state shared with the outside world

use node_api::SchedulerState;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const RUNNING: u8 = 0;
const STOPPING: u8 = 1;
const STOPPED: u8 = 2;

/// Cloneable handle for stopping a scheduler from another context
///
/// A stop only prevents new ticks from starting: the tick in progress
/// finishes, then the scheduler shuts down.
#[derive(Debug, Clone)]
pub struct StopHandle {
    state: Arc<AtomicU8>,
}

impl StopHandle {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(RUNNING)),
        }
    }

    /// Requests a stop; returns `false` if one was already requested
    pub fn stop(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, STOPPING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Returns the current lifecycle state
    pub fn state(&self) -> SchedulerState {
        match self.state.load(Ordering::SeqCst) {
            RUNNING => SchedulerState::Running,
            STOPPING => SchedulerState::Stopping,
            _ => SchedulerState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    pub(crate) fn mark_stopped(&self) {
        self.state.store(STOPPED, Ordering::SeqCst);
    }
}
