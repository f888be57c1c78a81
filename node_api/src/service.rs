//! Service records
//!
//! A [`Service`] is one node of the service tree, carrying the fields the
//! scheduler reads and writes: its filter membership, the number of
//! in-flight sequences referencing it, and its [`RestartHistory`].

use core_types::{Duration, Filter, Instant, ServiceId, ServiceState};
use serde::{Deserialize, Serialize};

/// Default number of slots in a restart ring
pub const DEFAULT_RING_SIZE: usize = 3;

/// Default restart window
pub const DEFAULT_RESTART_WINDOW: Duration = Duration::from_secs(60);

/// Outcome of asking a restart history for another restart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestartVerdict {
    /// The restart may proceed; the timestamp was recorded in `slot`
    Permit { slot: usize },
    /// The slot still holds a restart younger than the window
    Quarantine { slot: usize, last_restart: Instant },
}

impl RestartVerdict {
    /// Checks if the restart was permitted
    pub fn is_permit(&self) -> bool {
        matches!(self, RestartVerdict::Permit { .. })
    }
}

/// Fixed-size ring of recent restart timestamps
///
/// Every restart request advances the cursor by one slot (modulo the ring
/// size) and inspects only that slot. The slot can be reused once it is
/// unset or its timestamp is older than the window. The effective bound is
/// therefore a minimum spacing between reuses of the same slot, not a
/// strict count over the whole window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartHistory {
    slots: Vec<Option<Instant>>,
    cursor: usize,
    window: Duration,
}

impl RestartHistory {
    /// Creates an empty history with `ring_size` slots (at least one)
    pub fn new(ring_size: usize, window: Duration) -> Self {
        Self {
            slots: vec![None; ring_size.max(1)],
            cursor: 0,
            window,
        }
    }

    /// Returns the number of slots
    pub fn ring_size(&self) -> usize {
        self.slots.len()
    }

    /// Returns the configured window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns the current cursor position
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the timestamp held by `slot`, if any
    pub fn slot(&self, slot: usize) -> Option<Instant> {
        self.slots.get(slot).copied().flatten()
    }

    /// Advances the cursor and decides whether a restart at `now` is allowed
    pub fn record_restart(&mut self, now: Instant) -> RestartVerdict {
        self.cursor = (self.cursor + 1) % self.slots.len();
        let slot = self.cursor;

        match self.slots[slot] {
            Some(last_restart) if now.duration_since(last_restart) <= self.window => {
                RestartVerdict::Quarantine { slot, last_restart }
            }
            _ => {
                self.slots[slot] = Some(now);
                RestartVerdict::Permit { slot }
            }
        }
    }
}

impl Default for RestartHistory {
    fn default() -> Self {
        Self::new(DEFAULT_RING_SIZE, DEFAULT_RESTART_WINDOW)
    }
}

/// A node of the service tree
#[derive(Debug, Clone)]
pub struct Service {
    id: ServiceId,
    name: String,
    filter: Filter,
    state: ServiceState,
    ongoing_operations: u32,
    restarts: RestartHistory,
}

impl Service {
    /// Creates a stopped service with no in-flight operations
    pub fn new(name: impl Into<String>, filter: Filter, restarts: RestartHistory) -> Self {
        Self {
            id: ServiceId::new(),
            name: name.into(),
            filter,
            state: ServiceState::Stopped,
            ongoing_operations: 0,
            restarts,
        }
    }

    /// Returns the service ID
    pub fn id(&self) -> ServiceId {
        self.id
    }

    /// Returns the service name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the service's own role/group membership
    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Returns the last state a sequence drove this service to
    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Updates the service state
    pub fn set_state(&mut self, state: ServiceState) {
        self.state = state;
    }

    /// Returns the number of sequences currently referencing this service
    pub fn ongoing_operations(&self) -> u32 {
        self.ongoing_operations
    }

    /// Checks if no sequence currently references this service
    pub fn is_idle(&self) -> bool {
        self.ongoing_operations == 0
    }

    /// Records that a new sequence references this service
    pub fn acquire_operation(&mut self) {
        self.ongoing_operations = self.ongoing_operations.saturating_add(1);
    }

    /// Records that a referencing sequence completed
    ///
    /// Returns `false`, leaving the counter at zero, if nothing was in flight.
    pub fn release_operation(&mut self) -> bool {
        match self.ongoing_operations.checked_sub(1) {
            Some(remaining) => {
                self.ongoing_operations = remaining;
                true
            }
            None => false,
        }
    }

    /// Returns the restart history
    pub fn restarts(&self) -> &RestartHistory {
        &self.restarts
    }

    /// Returns the restart history mutably
    pub fn restarts_mut(&mut self) -> &mut RestartHistory {
        &mut self.restarts
    }
}
