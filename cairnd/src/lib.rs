//! # Cairn Node Daemon
//!
//! Hosts the service lifecycle scheduler on a simulated node.
//!
//! ## Architecture
//!
//! - `config`: TOML node description (scheduler settings, role, service tree)
//! - `script`: deterministic event scripts (crashes, role and group changes)
//! - `runtime`: the daemon loop driving the scheduler tick by tick

pub mod config;
pub mod runtime;
pub mod script;

pub use config::{ConfigError, NodeConfig, ServiceEntry};
pub use runtime::{DaemonConfig, DaemonError, DaemonRuntime, RunSummary, StopReason};
pub use script::{EventScript, ScriptError, ScriptedEvent};
