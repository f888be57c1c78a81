//! Failure reports from the process supervisor and health monitor

use core_types::ServiceId;
use serde::{Deserialize, Serialize};
use work_list::WorkList;

/// Kind of failure being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The service is no longer running and needs attention
    DisabledService,
    /// A report code the scheduler does not understand
    Unrecognized(u32),
}

/// A failure report awaiting the scheduler's attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// What happened
    pub kind: ErrorKind,
    /// The service it happened to
    pub service: ServiceId,
}

impl ErrorReport {
    /// Creates a `DisabledService` report
    pub fn disabled(service: ServiceId) -> Self {
        Self {
            kind: ErrorKind::DisabledService,
            service,
        }
    }
}

/// FIFO of failure reports drained by the scheduler every tick
pub type ErrorQueue = WorkList<ErrorReport>;

/// Watches service processes for exits
///
/// Polling must not block.
pub trait ProcessSupervisor {
    /// Appends a report for every newly observed exit
    fn poll_exits(&mut self, errors: &mut ErrorQueue);
}

/// Watches service health
///
/// Polling must not block.
pub trait HealthMonitor {
    /// Appends a report for every newly observed unhealthy service
    fn poll(&mut self, errors: &mut ErrorQueue);
}
