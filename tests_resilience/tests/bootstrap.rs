//! Bootstrap Tests
//!
//! Validates node bring-up under the filters and faults a real node meets:
//! group and role selection, refused builds, and a request server that
//! cannot bind.

use core_types::{Filter, ServiceState};
use node_api::{SequenceKind, ServiceTree};
use services_scheduler::{SchedulerConfig, SchedulerError};
use sim_node::fault_injection::{FactoryFault, FaultPlan, ServerFault};
use tests_resilience::{all_idle, bootstrap_with, layered_tree, settle, state_of, test_bootstrap};

/// Test: Bring-up starts every system service runnable on any node
#[test]
fn test_default_bring_up() {
    let layout = layered_tree();
    let (mut node, mut scheduler) = test_bootstrap(layout.tree);
    settle(&mut node, &mut scheduler);

    for id in [layout.db, layout.api, layout.worker] {
        assert_eq!(state_of(&node, id), ServiceState::Running);
    }
    // Master-only and group2 services are filtered out
    assert_eq!(state_of(&node, layout.cache), ServiceState::Stopped);
    assert_eq!(state_of(&node, layout.reports), ServiceState::Stopped);
    assert!(all_idle(&mut node));

    // Parents start before their children
    let starts: Vec<_> = node.factory.step_log().entries()[..3]
        .iter()
        .map(|(_, service)| *service)
        .collect();
    assert_eq!(starts, vec![layout.db, layout.api, layout.worker]);
}

/// Test: A master node also brings up master-only services
#[test]
fn test_master_bring_up() {
    let layout = layered_tree();
    let (mut node, mut scheduler) =
        bootstrap_with(layout.tree, FaultPlan::new(), &SchedulerConfig::default(), true).unwrap();
    settle(&mut node, &mut scheduler);

    assert_eq!(state_of(&node, layout.cache), ServiceState::Running);
    assert_eq!(state_of(&node, layout.reports), ServiceState::Stopped);
}

/// Test: Initial groups select which services come up
#[test]
fn test_initial_groups_select_services() {
    let layout = layered_tree();
    let config = SchedulerConfig {
        initial_groups: vec!["group2".to_string()],
        ..SchedulerConfig::default()
    };
    let (mut node, mut scheduler) =
        bootstrap_with(layout.tree, FaultPlan::new(), &config, false).unwrap();
    settle(&mut node, &mut scheduler);

    assert_eq!(scheduler.status().allowed_groups, Filter::group(2).unwrap());
    assert_eq!(state_of(&node, layout.reports), ServiceState::Running);
    assert_eq!(state_of(&node, layout.db), ServiceState::Stopped);
    assert_eq!(node.processes().start_count(layout.db), 0);
}

/// Test: A refused start build leaves services stopped but the queue drains
#[test]
fn test_refused_start_build_is_skipped() {
    let layout = layered_tree();
    let plan = FaultPlan::new().with_factory_fault(FactoryFault::RefuseKind {
        kind: SequenceKind::Start,
    });
    let (mut node, mut scheduler) =
        bootstrap_with(layout.tree, plan, &SchedulerConfig::default(), false).unwrap();

    assert_eq!(scheduler.context().pending_sequences(), 1);
    assert_eq!(node.factory.refusals(), 1);
    settle(&mut node, &mut scheduler);

    assert_eq!(node.processes().start_count(layout.db), 0);
    assert!(all_idle(&mut node));
    assert!(scheduler.is_running());
}

/// Test: A request server that cannot bind aborts startup cleanly
#[test]
fn test_bind_failure_leaves_nothing_running() {
    let layout = layered_tree();
    let plan = FaultPlan::new().with_server_fault(ServerFault::BindFailure);
    let result = bootstrap_with(layout.tree, plan, &SchedulerConfig::default(), false);

    assert!(matches!(result, Err(SchedulerError::ServerStart(_))));
}

/// Test: Bring-up locks are released as soon as the sequences are built
#[test]
fn test_bring_up_lock_is_released() {
    let layout = layered_tree();
    let (node, _scheduler) = test_bootstrap(layout.tree);

    assert_eq!(node.tree.held_lock_count(), 0);
    let history = node.tree.lock_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].node, node.tree.root());
    assert!(!history[0].exclusive);
}
