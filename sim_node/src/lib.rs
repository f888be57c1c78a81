//! # Simulated Node
//!
//! This crate provides simulated implementations of every collaborator the
//! lifecycle scheduler talks to.
//!
//! ## Purpose
//!
//! The simulated node allows testing orchestration without a cluster:
//! - Runs under `cargo test`
//! - Deterministic (virtual clock, no real concurrency)
//! - Fast (no processes are spawned, no sockets are opened)
//! - Inspectable (build logs, step logs, poll timeouts are all recorded)
//!
//! ## Philosophy
//!
//! **Testability is a first-class design constraint.**
//!
//! This is not a mock - it is a complete in-memory node: a real service
//! tree, a factory whose sequences really walk that tree, and a process
//! table whose crashes are really reported back.

pub mod clock;
pub mod fault_injection;
pub mod membership;
pub mod monitor;
pub mod processes;
pub mod sequence;
pub mod server;
pub mod test_utils;
pub mod tree;

pub use clock::SimClock;
pub use fault_injection::{FactoryFault, FaultPlan, ServerFault, ServiceFault};
pub use membership::SimMembership;
pub use monitor::{SimHealthMonitor, SimSupervisor};
pub use processes::{ProcessState, SimProcesses};
pub use sequence::{BuildRecord, SimSequence, SimSequenceFactory, StepLog};
pub use server::SimRequestServer;
pub use tree::{LockRecord, MemoryServiceTree};

use node_api::NodeRuntime;

/// Every simulated collaborator of one node
///
/// Fields are public so tests and hosts can borrow each collaborator
/// independently.
pub struct SimNode {
    pub tree: MemoryServiceTree,
    pub factory: SimSequenceFactory,
    pub supervisor: SimSupervisor,
    pub monitor: SimHealthMonitor,
    pub server: SimRequestServer,
    pub membership: SimMembership,
    pub clock: SimClock,
    processes: SimProcesses,
}

impl SimNode {
    /// Creates a node around `tree` with no injected faults
    pub fn new(tree: MemoryServiceTree) -> Self {
        Self::with_fault_plan(tree, FaultPlan::new())
    }

    /// Creates a node around `tree` applying `plan`
    pub fn with_fault_plan(tree: MemoryServiceTree, plan: FaultPlan) -> Self {
        let processes = SimProcesses::new();
        for fault in plan.service_faults() {
            match fault {
                ServiceFault::CrashOnStart { service, count } => {
                    processes.crash_on_start(*service, *count);
                }
            }
        }

        Self {
            tree,
            factory: SimSequenceFactory::new(processes.clone())
                .with_faults(plan.factory_faults().to_vec()),
            supervisor: SimSupervisor::new(processes.clone()),
            monitor: SimHealthMonitor::new(processes.clone()),
            server: SimRequestServer::new().with_faults(plan.server_faults().to_vec()),
            membership: SimMembership::new(false),
            clock: SimClock::new(),
            processes,
        }
    }

    /// Returns the shared process table
    pub fn processes(&self) -> &SimProcesses {
        &self.processes
    }

    /// Lends every collaborator for one scheduler call
    pub fn runtime(&mut self) -> NodeRuntime<'_> {
        NodeRuntime {
            tree: &mut self.tree,
            factory: &mut self.factory,
            supervisor: &mut self.supervisor,
            monitor: &mut self.monitor,
            server: &mut self.server,
            membership: &mut self.membership,
            clock: &self.clock,
        }
    }
}
