//! Role and Group Change Tests
//!
//! Validates that master elections and allowed-group changes decide which
//! services the scheduler starts, stops and restarts.

use core_types::{Filter, ServiceState};
use node_api::{ClientRequest, ErrorReport, Response};
use services_scheduler::SchedulerConfig;
use sim_node::fault_injection::FaultPlan;
use sim_node::ProcessState;
use tests_resilience::{
    all_idle, bootstrap_with, crash_and_settle, layered_tree, settle, state_of, test_bootstrap,
};

/// Test: Promotion starts master-only services and nothing else
#[test]
fn test_promotion_starts_master_services() {
    let layout = layered_tree();
    let (mut node, mut scheduler) = test_bootstrap(layout.tree);
    settle(&mut node, &mut scheduler);

    node.membership.set_master(true);
    let enqueued = scheduler
        .change_master_role(&mut node.runtime(), true)
        .unwrap();
    assert_eq!(enqueued, 2);
    settle(&mut node, &mut scheduler);

    assert_eq!(state_of(&node, layout.cache), ServiceState::Running);
    assert_eq!(node.processes().start_count(layout.db), 1);
    assert_eq!(node.processes().start_count(layout.reports), 0);
    assert!(all_idle(&mut node));
}

/// Test: Demotion stops master-only services and leaves the rest running
#[test]
fn test_demotion_stops_master_services() {
    let layout = layered_tree();
    let (mut node, mut scheduler) =
        bootstrap_with(layout.tree, FaultPlan::new(), &SchedulerConfig::default(), true).unwrap();
    settle(&mut node, &mut scheduler);
    assert_eq!(state_of(&node, layout.cache), ServiceState::Running);

    node.membership.set_master(false);
    scheduler
        .change_master_role(&mut node.runtime(), false)
        .unwrap();
    settle(&mut node, &mut scheduler);

    assert_eq!(state_of(&node, layout.cache), ServiceState::Stopped);
    assert_eq!(node.processes().state(layout.cache), ProcessState::Stopped);
    assert_eq!(state_of(&node, layout.db), ServiceState::Running);
}

/// Test: After promotion a crashed master service is restarted
#[test]
fn test_promoted_node_restarts_master_services() {
    let layout = layered_tree();
    let (mut node, mut scheduler) = test_bootstrap(layout.tree);
    settle(&mut node, &mut scheduler);

    node.membership.set_master(true);
    scheduler
        .change_master_role(&mut node.runtime(), true)
        .unwrap();
    settle(&mut node, &mut scheduler);

    crash_and_settle(&mut node, &mut scheduler, layout.cache);
    assert_eq!(node.processes().start_count(layout.cache), 2);
    assert_eq!(state_of(&node, layout.cache), ServiceState::Running);
}

/// Test: After demotion a master-only service is no longer restarted
#[test]
fn test_demoted_node_does_not_restart_master_services() {
    let layout = layered_tree();
    let (mut node, mut scheduler) =
        bootstrap_with(layout.tree, FaultPlan::new(), &SchedulerConfig::default(), true).unwrap();
    settle(&mut node, &mut scheduler);

    node.membership.set_master(false);
    scheduler
        .change_master_role(&mut node.runtime(), false)
        .unwrap();
    settle(&mut node, &mut scheduler);

    node.monitor.inject(ErrorReport::disabled(layout.cache));
    scheduler.tick(&mut node.runtime());
    settle(&mut node, &mut scheduler);

    assert_eq!(node.processes().start_count(layout.cache), 1);
    assert_eq!(state_of(&node, layout.cache), ServiceState::Stopped);
}

/// Test: Services in a denied group are not restarted after a crash
#[test]
fn test_denied_group_is_not_restarted() {
    let layout = layered_tree();
    let (mut node, mut scheduler) = test_bootstrap(layout.tree);
    settle(&mut node, &mut scheduler);

    let allowed = scheduler.change_allowed_groups(false, Filter::SYSTEM);
    assert_eq!(allowed, Filter::NONE);

    crash_and_settle(&mut node, &mut scheduler, layout.db);
    assert_eq!(node.processes().state(layout.db), ProcessState::Failed);
    assert_eq!(node.processes().start_count(layout.db), 1);
    assert!(all_idle(&mut node));
}

/// Test: Allowing a group does not start its services until a sequence covers them
#[test]
fn test_allowed_group_applies_to_later_sequences() {
    let layout = layered_tree();
    let (mut node, mut scheduler) = test_bootstrap(layout.tree);
    settle(&mut node, &mut scheduler);

    scheduler.change_allowed_groups(true, Filter::group(2).unwrap());
    settle(&mut node, &mut scheduler);
    assert_eq!(node.processes().start_count(layout.reports), 0);

    // A restart of reports now selects it
    node.monitor.inject(ErrorReport::disabled(layout.reports));
    scheduler.tick(&mut node.runtime());
    settle(&mut node, &mut scheduler);
    assert_eq!(node.processes().start_count(layout.reports), 1);
    assert_eq!(state_of(&node, layout.reports), ServiceState::Running);
}

/// Test: Role and group changes arrive as client requests
#[test]
fn test_changes_through_request_server() {
    let layout = layered_tree();
    let (mut node, mut scheduler) = test_bootstrap(layout.tree);
    settle(&mut node, &mut scheduler);

    node.membership.set_master(true);
    let promote = node
        .server
        .submit(ClientRequest::ChangeMasterRole { promoting: true });
    let allow = node.server.submit(ClientRequest::ChangeAllowedGroups {
        add: true,
        filter: Filter::group(2).unwrap() | Filter::MASTER,
    });
    let report = scheduler.tick(&mut node.runtime());
    assert_eq!(report.requests_handled, 2);
    settle(&mut node, &mut scheduler);

    assert_eq!(node.server.response_to(promote), Some(&Response::Ack));
    assert_eq!(node.server.response_to(allow), Some(&Response::Ack));
    assert_eq!(state_of(&node, layout.cache), ServiceState::Running);

    // Role bits in a group change are ignored
    assert_eq!(
        scheduler.status().allowed_groups,
        Filter::SYSTEM | Filter::group(2).unwrap()
    );
}
