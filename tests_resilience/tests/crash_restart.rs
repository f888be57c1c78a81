//! Crash and Restart Tests
//!
//! Validates that the scheduler restarts crashed services according to
//! their restart history, and only touches the crashed subtree.

use core_types::{Duration, ServiceState};
use node_api::{ErrorReport, RestartVerdict, ServiceTree};
use services_scheduler::SchedulerConfig;
use sim_node::fault_injection::{FaultPlan, ServiceFault};
use sim_node::ProcessState;
use tests_resilience::{
    all_idle, bootstrap_with, crash_and_settle, layered_tree, settle, state_of, test_bootstrap,
};

/// Test: A crashed leaf service is restarted and nothing else moves
#[test]
fn test_leaf_crash_restarts_only_the_leaf() {
    let layout = layered_tree();
    let (mut node, mut scheduler) = test_bootstrap(layout.tree);
    settle(&mut node, &mut scheduler);

    crash_and_settle(&mut node, &mut scheduler, layout.worker);

    assert_eq!(node.processes().start_count(layout.worker), 2);
    assert_eq!(node.processes().start_count(layout.api), 1);
    assert_eq!(node.processes().start_count(layout.db), 1);
    assert_eq!(state_of(&node, layout.worker), ServiceState::Running);
    assert!(all_idle(&mut node));
}

/// Test: A crashed parent takes its whole subtree through the restart
#[test]
fn test_parent_crash_restarts_subtree() {
    let layout = layered_tree();
    let (mut node, mut scheduler) = test_bootstrap(layout.tree);
    settle(&mut node, &mut scheduler);

    crash_and_settle(&mut node, &mut scheduler, layout.db);

    for id in [layout.db, layout.api, layout.worker] {
        assert_eq!(node.processes().start_count(id), 2);
        assert_eq!(node.processes().state(id), ProcessState::Running);
        assert_eq!(state_of(&node, id), ServiceState::Running);
    }
    assert!(all_idle(&mut node));
}

/// Test: Children are stopped before their parent and started after it
#[test]
fn test_restart_orders_stop_bottom_up_and_start_top_down() {
    let layout = layered_tree();
    let (mut node, mut scheduler) = test_bootstrap(layout.tree);
    settle(&mut node, &mut scheduler);
    let steps_before = node.factory.step_log().len();

    crash_and_settle(&mut node, &mut scheduler, layout.db);

    let restart_steps: Vec<_> = node.factory.step_log().entries()[steps_before..]
        .iter()
        .map(|(_, service)| *service)
        .collect();
    let db = layout.db;
    let api = layout.api;
    let worker = layout.worker;
    assert_eq!(
        restart_steps,
        vec![worker, api, db, db, api, worker, db, api, worker]
    );
}

/// Test: The fourth crash inside the window quarantines the subtree
#[test]
fn test_crash_loop_is_quarantined() {
    let layout = layered_tree();
    let (mut node, mut scheduler) = test_bootstrap(layout.tree);
    settle(&mut node, &mut scheduler);

    for _ in 0..3 {
        crash_and_settle(&mut node, &mut scheduler, layout.api);
        node.clock.advance(Duration::from_secs(2));
        assert_eq!(state_of(&node, layout.api), ServiceState::Running);
    }
    crash_and_settle(&mut node, &mut scheduler, layout.api);

    assert_eq!(node.processes().start_count(layout.api), 4);
    assert_eq!(state_of(&node, layout.api), ServiceState::Stopped);
    assert_eq!(state_of(&node, layout.worker), ServiceState::Stopped);
    assert_eq!(node.processes().state(layout.api), ProcessState::Stopped);

    // The parent keeps running
    assert_eq!(state_of(&node, layout.db), ServiceState::Running);
    assert!(all_idle(&mut node));
}

/// Test: Crashes spaced wider than the window are always restarted
#[test]
fn test_slow_crashes_are_never_quarantined() {
    let layout = layered_tree();
    let (mut node, mut scheduler) = test_bootstrap(layout.tree);
    settle(&mut node, &mut scheduler);

    for _ in 0..6 {
        node.clock.advance(Duration::from_secs(61));
        crash_and_settle(&mut node, &mut scheduler, layout.worker);
        assert_eq!(state_of(&node, layout.worker), ServiceState::Running);
    }
    assert_eq!(node.processes().start_count(layout.worker), 7);
}

/// Test: A quarantined service stays down even if reported again
#[test]
fn test_quarantined_service_is_not_revived_by_later_reports() {
    let layout = layered_tree();
    let (mut node, mut scheduler) = test_bootstrap(layout.tree);
    settle(&mut node, &mut scheduler);

    for _ in 0..4 {
        crash_and_settle(&mut node, &mut scheduler, layout.worker);
    }
    assert_eq!(state_of(&node, layout.worker), ServiceState::Stopped);

    // Every slot still holds a restart from inside the window
    let verdict = scheduler.apply_restart_policy(&mut node.runtime(), layout.worker);
    assert!(matches!(verdict, Some(RestartVerdict::Quarantine { .. })));
    settle(&mut node, &mut scheduler);
    assert_eq!(state_of(&node, layout.worker), ServiceState::Stopped);
    assert_eq!(node.processes().start_count(layout.worker), 4);
}

/// Test: A crash reported while its service is busy is lost by the
/// edge-triggered supervisor, and recovered by the level-triggered monitor
#[test]
fn test_health_monitor_recovers_crash_seen_while_busy() {
    let layout = layered_tree();
    let plan = FaultPlan::new().with_service_fault(ServiceFault::CrashOnStart {
        service: layout.worker,
        count: 1,
    });

    // Without the monitor the failure stays unnoticed
    let (mut node, mut scheduler) =
        bootstrap_with(layout.tree, plan, &SchedulerConfig::default(), false).unwrap();
    settle(&mut node, &mut scheduler);
    assert_eq!(state_of(&node, layout.worker), ServiceState::Failed);
    assert_eq!(node.processes().start_count(layout.worker), 1);

    // With the monitor the next idle tick picks it up
    node.monitor.set_enabled(true);
    scheduler.tick(&mut node.runtime());
    settle(&mut node, &mut scheduler);
    assert_eq!(state_of(&node, layout.worker), ServiceState::Running);
    assert_eq!(node.processes().start_count(layout.worker), 2);
}

/// Test: Reports injected through the health monitor trigger restarts
#[test]
fn test_injected_health_report_restarts_service() {
    let layout = layered_tree();
    let (mut node, mut scheduler) = test_bootstrap(layout.tree);
    settle(&mut node, &mut scheduler);

    node.monitor.inject(ErrorReport::disabled(layout.api));
    scheduler.tick(&mut node.runtime());
    settle(&mut node, &mut scheduler);

    assert_eq!(node.processes().start_count(layout.api), 2);
    assert_eq!(node.processes().start_count(layout.worker), 2);
    assert_eq!(node.processes().start_count(layout.db), 1);
    assert_eq!(
        node.tree.service(layout.api).unwrap().restarts().cursor(),
        1
    );
}
