//! Replays the bundled demo scripts against the bundled node configuration

use cairnd::{DaemonConfig, DaemonRuntime, NodeConfig, StopReason};
use core_types::{Filter, ServiceState};
use node_api::{Response, ServiceTree};
use sim_node::ProcessState;
use std::path::PathBuf;

const STEP_LIMIT: usize = 500;

fn demo_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join(name)
}

fn demo_runtime(script: &str) -> DaemonRuntime {
    let config = NodeConfig::from_file(&demo_path("cairn.toml")).unwrap();
    let script = std::fs::read_to_string(demo_path(script)).unwrap();
    DaemonRuntime::new(
        &config,
        DaemonConfig {
            script: Some(script),
            ..DaemonConfig::default()
        },
    )
    .unwrap()
}

fn state_of(runtime: &DaemonRuntime, name: &str) -> ServiceState {
    let tree = &runtime.node().tree;
    tree.service(tree.find(name).unwrap()).unwrap().state()
}

fn start_count(runtime: &DaemonRuntime, name: &str) -> usize {
    let id = runtime.node().tree.find(name).unwrap();
    runtime.node().processes().start_count(id)
}

#[test]
fn test_demo_config_loads() {
    let config = NodeConfig::from_file(&demo_path("cairn.toml")).unwrap();
    assert_eq!(config.services.len(), 4);
    assert!(!config.node.master);

    let tree = config.build_tree().unwrap();
    assert_eq!(tree.len(), 5);
}

#[test]
fn test_missing_config_file() {
    let result = NodeConfig::from_file(&demo_path("missing.toml"));
    assert!(matches!(result, Err(cairnd::ConfigError::Io(_))));
}

#[test]
fn test_crash_loop_ends_in_quarantine() {
    let mut runtime = demo_runtime("crash_loop.cairn");
    for _ in 0..STEP_LIMIT {
        if runtime.is_settled() {
            break;
        }
        runtime.step();
    }
    assert!(runtime.is_settled());

    // Initial start plus three permitted restarts
    assert_eq!(start_count(&runtime, "db"), 4);
    let db = runtime.node().tree.find("db").unwrap();
    assert_eq!(runtime.node().processes().state(db), ProcessState::Stopped);
    assert_eq!(state_of(&runtime, "db"), ServiceState::Stopped);
    assert_eq!(state_of(&runtime, "api"), ServiceState::Stopped);

    // Services outside the crashed subtree are untouched
    assert_eq!(state_of(&runtime, "leader-cache"), ServiceState::Stopped);
    assert_eq!(start_count(&runtime, "leader-cache"), 0);
    assert_eq!(start_count(&runtime, "reports"), 0);

    let last = runtime.node().server.responses().last().map(|(_, r)| r.clone());
    assert!(matches!(last, Some(Response::Status(_))));
}

#[test]
fn test_role_change_demo() {
    let mut runtime = demo_runtime("role_change.cairn");
    for _ in 0..STEP_LIMIT {
        if !runtime.scheduler().is_running() {
            break;
        }
        runtime.step();
    }
    assert!(!runtime.scheduler().is_running());

    assert_eq!(start_count(&runtime, "leader-cache"), 1);
    let cache = runtime.node().tree.find("leader-cache").unwrap();
    assert_eq!(
        runtime.node().processes().state(cache),
        ProcessState::Stopped
    );

    // Role changes leave non-master services alone
    assert_eq!(start_count(&runtime, "db"), 1);
    assert_eq!(state_of(&runtime, "db"), ServiceState::Running);

    // Allowing a group does not start its services
    assert_eq!(start_count(&runtime, "reports"), 0);

    let responses = runtime.node().server.responses();
    assert_eq!(responses.len(), 5);
    match &responses[3].1 {
        Response::Status(status) => {
            assert_eq!(
                status.allowed_groups,
                Filter::SYSTEM | Filter::group(2).unwrap()
            );
        }
        other => panic!("expected status, got {:?}", other),
    }
    assert_eq!(responses[4].1, Response::Ack);
}

#[test]
fn test_run_stops_on_scripted_shutdown() {
    let summary = demo_runtime("role_change.cairn").run();
    assert_eq!(summary.reason, StopReason::Requested);
    assert!(summary.last_status.is_some());
}
