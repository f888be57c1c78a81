//! Resilience Test Utilities
//!
//! This crate provides shared utilities for resilience and integration tests.
//!
//! ## Test Philosophy
//!
//! - **Safety under faults**: The scheduler keeps its invariants when services crash
//! - **Deterministic failures**: All faults are reproducible via FaultPlan
//! - **No leaked operations**: Every ongoing-operation counter returns to zero
//!   once the queue drains

use core_types::{Domain, Filter, ServiceId, ServiceState};
use node_api::{Service, ServiceTree};
use services_scheduler::{Scheduler, SchedulerConfig, SchedulerError};
use sim_node::fault_injection::FaultPlan;
use sim_node::test_utils::{service, system_filter};
use sim_node::{MemoryServiceTree, SimNode};

/// Upper bound on ticks any test waits for the queue to drain
pub const SETTLE_LIMIT: usize = 1_000;

/// A small tree covering every kind of service the scheduler filters on
///
/// ```text
/// root
/// ├── db          system, any node
/// │   └── api     system, any node
/// │       └── worker  system, any node
/// ├── cache       system, master only
/// └── reports     group2, any node
/// ```
pub struct LayeredTree {
    pub tree: MemoryServiceTree,
    pub db: ServiceId,
    pub api: ServiceId,
    pub worker: ServiceId,
    pub cache: ServiceId,
    pub reports: ServiceId,
}

/// Builds the [`LayeredTree`]
pub fn layered_tree() -> LayeredTree {
    let mut tree = MemoryServiceTree::new("root");
    let root = tree.root();
    let group2 = Filter::group(2).expect("group2 exists");

    let db = tree
        .add_service(root, service("db", system_filter()))
        .expect("Failed to add db");
    let api = tree
        .add_service(db, service("api", system_filter()))
        .expect("Failed to add api");
    let worker = tree
        .add_service(api, service("worker", system_filter()))
        .expect("Failed to add worker");
    let cache = tree
        .add_service(root, service("cache", Filter::SYSTEM | Filter::MASTER))
        .expect("Failed to add cache");
    let reports = tree
        .add_service(root, service("reports", group2 | Filter::ANY_NODE))
        .expect("Failed to add reports");

    LayeredTree {
        tree,
        db,
        api,
        worker,
        cache,
        reports,
    }
}

/// Bootstrap helper for tests
///
/// Starts a scheduler with the default configuration on a non-master node.
pub fn test_bootstrap(tree: MemoryServiceTree) -> (SimNode, Scheduler) {
    bootstrap_with(tree, FaultPlan::new(), &SchedulerConfig::default(), false)
        .expect("Failed to start scheduler")
}

/// Starts a scheduler on a node with `plan` applied
pub fn bootstrap_with(
    tree: MemoryServiceTree,
    plan: FaultPlan,
    config: &SchedulerConfig,
    master: bool,
) -> Result<(SimNode, Scheduler), SchedulerError> {
    let mut node = SimNode::with_fault_plan(tree, plan);
    node.membership.set_master(master);
    let scheduler = Scheduler::start(config, &mut node.runtime())?;
    Ok((node, scheduler))
}

/// Ticks until the sequence queue is empty; returns the ticks taken
pub fn settle(node: &mut SimNode, scheduler: &mut Scheduler) -> usize {
    let mut ticks = 0;
    while scheduler.context().pending_sequences() > 0 {
        assert!(ticks < SETTLE_LIMIT, "sequence queue never drained");
        scheduler.tick(&mut node.runtime());
        ticks += 1;
    }
    ticks
}

/// Crashes `service` and ticks until every resulting sequence retired
pub fn crash_and_settle(node: &mut SimNode, scheduler: &mut Scheduler, service: ServiceId) {
    node.processes().crash(service);
    scheduler.tick(&mut node.runtime());
    settle(node, scheduler);
}

/// Returns the lifecycle state of `id`
pub fn state_of(node: &SimNode, id: ServiceId) -> ServiceState {
    node.tree
        .service(id)
        .map(|service| service.state())
        .expect("service exists")
}

/// Checks that no service holds an ongoing operation
pub fn all_idle(node: &mut SimNode) -> bool {
    let root = node.tree.root();
    let mut idle = true;
    node.tree
        .walk(root, Domain::Subtree, &mut |service: &mut Service| {
            idle &= service.is_idle();
        })
        .expect("root is walkable");
    idle
}
