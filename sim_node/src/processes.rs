//! Simulated process table
//!
//! The table is shared between the sequence factory (which starts and stops
//! processes), the supervisor (which reports exits) and the health monitor
//! (which reports failed processes). Clones share one table.

use core_types::ServiceId;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// State of a simulated service process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessState {
    #[default]
    Stopped,
    Running,
    /// The process exited on its own
    Failed,
}

#[derive(Debug, Default)]
struct ProcessTable {
    states: HashMap<ServiceId, ProcessState>,
    pending_crashes: HashMap<ServiceId, usize>,
    exits: VecDeque<ServiceId>,
    starts: HashMap<ServiceId, usize>,
}

/// Shared handle to the process table
#[derive(Debug, Clone, Default)]
pub struct SimProcesses {
    table: Rc<RefCell<ProcessTable>>,
}

impl SimProcesses {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` starts of `service` exit immediately
    pub fn crash_on_start(&self, service: ServiceId, count: usize) {
        let mut table = self.table.borrow_mut();
        *table.pending_crashes.entry(service).or_insert(0) += count;
    }

    /// Starts the process for `service`
    ///
    /// Returns the resulting state: `Failed` if a crash was scheduled.
    pub fn start(&self, service: ServiceId) -> ProcessState {
        let mut table = self.table.borrow_mut();
        *table.starts.entry(service).or_insert(0) += 1;

        let crash = match table.pending_crashes.get_mut(&service) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };

        if crash {
            table.states.insert(service, ProcessState::Failed);
            table.exits.push_back(service);
            ProcessState::Failed
        } else {
            table.states.insert(service, ProcessState::Running);
            ProcessState::Running
        }
    }

    /// Stops the process for `service`
    pub fn stop(&self, service: ServiceId) {
        self.table
            .borrow_mut()
            .states
            .insert(service, ProcessState::Stopped);
    }

    /// Kills a running process as if it had exited on its own
    pub fn crash(&self, service: ServiceId) {
        let mut table = self.table.borrow_mut();
        table.states.insert(service, ProcessState::Failed);
        table.exits.push_back(service);
    }

    /// Returns the process state of `service`
    pub fn state(&self, service: ServiceId) -> ProcessState {
        self.table
            .borrow()
            .states
            .get(&service)
            .copied()
            .unwrap_or_default()
    }

    /// Returns how many times `service` was started
    pub fn start_count(&self, service: ServiceId) -> usize {
        self.table
            .borrow()
            .starts
            .get(&service)
            .copied()
            .unwrap_or(0)
    }

    /// Removes and returns every exit observed since the last drain
    pub fn drain_exits(&self) -> Vec<ServiceId> {
        self.table.borrow_mut().exits.drain(..).collect()
    }

    /// Returns every service whose process is currently failed
    pub fn failed(&self) -> Vec<ServiceId> {
        let table = self.table.borrow();
        let mut failed: Vec<ServiceId> = table
            .states
            .iter()
            .filter(|(_, state)| **state == ProcessState::Failed)
            .map(|(id, _)| *id)
            .collect();
        failed.sort_by_key(|id| id.as_uuid());
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_and_stop() {
        let processes = SimProcesses::new();
        let svc = ServiceId::new();
        assert_eq!(processes.state(svc), ProcessState::Stopped);

        assert_eq!(processes.start(svc), ProcessState::Running);
        assert_eq!(processes.start_count(svc), 1);

        processes.stop(svc);
        assert_eq!(processes.state(svc), ProcessState::Stopped);
        assert!(processes.drain_exits().is_empty());
    }

    #[test]
    fn test_crash_on_start_is_counted() {
        let processes = SimProcesses::new();
        let svc = ServiceId::new();
        processes.crash_on_start(svc, 1);

        assert_eq!(processes.start(svc), ProcessState::Failed);
        assert_eq!(processes.drain_exits(), vec![svc]);
        assert_eq!(processes.failed(), vec![svc]);

        assert_eq!(processes.start(svc), ProcessState::Running);
        assert!(processes.failed().is_empty());
    }

    #[test]
    fn test_crash_records_exit_once() {
        let processes = SimProcesses::new();
        let svc = ServiceId::new();
        processes.start(svc);
        processes.crash(svc);

        let shared = processes.clone();
        assert_eq!(shared.drain_exits(), vec![svc]);
        assert!(processes.drain_exits().is_empty());
        assert_eq!(processes.state(svc), ProcessState::Failed);
    }
}
