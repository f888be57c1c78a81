//! Test utilities for orchestration testing
//!
//! Helpers for building small service trees and simulated nodes without
//! repeating the same setup in every test.

use crate::fault_injection::FaultPlan;
use crate::tree::MemoryServiceTree;
use crate::SimNode;
use core_types::{Duration, Filter, ServiceId};
use node_api::{RestartHistory, Service, ServiceTree, TreeError};

/// Filter of a plain system service that runs on every node
pub fn system_filter() -> Filter {
    Filter::SYSTEM | Filter::ANY_NODE
}

/// Creates a service with the default restart ring
pub fn service(name: &str, filter: Filter) -> Service {
    Service::new(name, filter, RestartHistory::default())
}

/// Creates a service with a custom restart ring
pub fn service_with_ring(name: &str, filter: Filter, ring_size: usize, window: Duration) -> Service {
    Service::new(name, filter, RestartHistory::new(ring_size, window))
}

/// Builds a tree holding one service directly under the root
pub fn single_service_tree(name: &str, filter: Filter) -> Result<(MemoryServiceTree, ServiceId), TreeError> {
    let mut tree = MemoryServiceTree::new("root");
    let root = tree.root();
    let id = tree.add_service(root, service(name, filter))?;
    Ok((tree, id))
}

/// Runs a test against a node built from `tree` with `plan` applied
///
/// # Example
///
/// ```
/// use sim_node::fault_injection::{FaultPlan, ServerFault};
/// use sim_node::test_utils::{single_service_tree, system_filter, with_fault_plan};
///
/// let (tree, _) = single_service_tree("db", system_filter()).unwrap();
/// with_fault_plan(tree, FaultPlan::new().with_server_fault(ServerFault::BindFailure), |node| {
///     assert!(node.processes().failed().is_empty());
/// });
/// ```
pub fn with_fault_plan<F>(tree: MemoryServiceTree, plan: FaultPlan, f: F)
where
    F: FnOnce(&mut SimNode),
{
    let mut node = SimNode::with_fault_plan(tree, plan);
    f(&mut node);
}
