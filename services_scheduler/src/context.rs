//! Scheduler-owned state
//!
//! The context is created by [`crate::Scheduler::start`] and torn down by
//! [`crate::Scheduler::shutdown`]. Nothing outside the scheduler holds a
//! reference to it.

use core_types::Filter;
use node_api::{ErrorQueue, Sequence, ServerHandle};
use std::fmt;
use tracing::debug;
use work_list::{WorkList, WorkListError};

/// FIFO of sequences; only the head is ever stepped
pub type SequenceQueue = WorkList<Box<dyn Sequence>>;

/// Queues and process-wide filter state of one scheduler
pub struct SchedulerContext {
    pub(crate) sequences: SequenceQueue,
    pub(crate) errors: ErrorQueue,
    pub(crate) allowed_groups: Filter,
    pub(crate) server: Option<ServerHandle>,
    pub(crate) port: u16,
}

/// What was left behind when a context was torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeardownCounts {
    /// Sequences that never completed
    pub abandoned_sequences: usize,
    /// Reports that were never handled
    pub dropped_reports: usize,
}

impl SchedulerContext {
    /// Allocates both queues, bounding the sequence queue at `max_sequences`
    pub fn allocate(
        allowed_groups: Filter,
        port: u16,
        max_sequences: usize,
    ) -> Result<Self, WorkListError> {
        Ok(Self {
            sequences: WorkList::fifo()?.with_limit(max_sequences),
            errors: WorkList::fifo()?,
            allowed_groups,
            server: None,
            port,
        })
    }

    pub fn allowed_groups(&self) -> Filter {
        self.allowed_groups
    }

    pub fn pending_sequences(&self) -> usize {
        self.sequences.len()
    }

    pub fn pending_reports(&self) -> usize {
        self.errors.len()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the sequence that the next tick will step
    pub fn head(&self) -> Option<&dyn Sequence> {
        self.sequences.peek_first().map(|seq| &**seq)
    }

    /// Iterates over queued sequences, head first
    pub fn sequences(&self) -> impl Iterator<Item = &dyn Sequence> {
        self.sequences.iter().map(|seq| &**seq)
    }

    /// Releases both queues
    ///
    /// Sequences still queued are destroyed without being rolled back.
    pub fn free(self) -> TeardownCounts {
        let abandoned_sequences = self.sequences.free_with(|seq| {
            debug!(
                sequence = %seq.id(),
                kind = %seq.kind(),
                status = ?seq.status(),
                "Abandoning sequence"
            );
        });
        let dropped_reports = self.errors.free();

        TeardownCounts {
            abandoned_sequences,
            dropped_reports,
        }
    }
}

impl fmt::Debug for SchedulerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerContext")
            .field("pending_sequences", &self.sequences.len())
            .field("errors", &self.errors)
            .field("allowed_groups", &self.allowed_groups)
            .field("server", &self.server)
            .field("port", &self.port)
            .finish()
    }
}
