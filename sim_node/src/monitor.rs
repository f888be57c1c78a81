//! Simulated failure detectors
//!
//! The supervisor is edge-triggered: each process exit is reported once.
//! The health monitor is level-triggered: a failed process is reported on
//! every poll until something restarts or stops it.

use crate::processes::SimProcesses;
use node_api::{ErrorQueue, ErrorReport, HealthMonitor, ProcessSupervisor};
use tracing::{debug, warn};

/// Reports process exits
#[derive(Debug)]
pub struct SimSupervisor {
    processes: SimProcesses,
    reported: usize,
}

impl SimSupervisor {
    pub fn new(processes: SimProcesses) -> Self {
        Self {
            processes,
            reported: 0,
        }
    }

    /// Returns how many reports were produced so far
    pub fn reported(&self) -> usize {
        self.reported
    }
}

impl ProcessSupervisor for SimSupervisor {
    fn poll_exits(&mut self, errors: &mut ErrorQueue) {
        for service in self.processes.drain_exits() {
            debug!(service = %service, "Process exit observed");
            if errors.add(ErrorReport::disabled(service)).is_err() {
                warn!(service = %service, "Dropped exit report: error queue allocation failed");
                continue;
            }
            self.reported += 1;
        }
    }
}

/// Reports failed processes and injected reports
#[derive(Debug)]
pub struct SimHealthMonitor {
    processes: SimProcesses,
    enabled: bool,
    injected: Vec<ErrorReport>,
}

impl SimHealthMonitor {
    /// Creates a monitor; it only watches processes once enabled
    pub fn new(processes: SimProcesses) -> Self {
        Self {
            processes,
            enabled: false,
            injected: Vec::new(),
        }
    }

    /// Starts or stops reporting failed processes on every poll
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Queues a report for the next poll
    pub fn inject(&mut self, report: ErrorReport) {
        self.injected.push(report);
    }
}

impl HealthMonitor for SimHealthMonitor {
    fn poll(&mut self, errors: &mut ErrorQueue) {
        let mut reports: Vec<ErrorReport> = self.injected.drain(..).collect();
        if self.enabled {
            reports.extend(self.processes.failed().into_iter().map(ErrorReport::disabled));
        }

        for report in reports {
            if errors.add(report).is_err() {
                warn!(service = %report.service, "Dropped health report: error queue allocation failed");
            }
        }
    }
}
