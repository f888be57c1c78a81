//! # Daemon Runtime
//!
//! The main loop that ties the scheduler to a simulated node.
//!
//! Each step feeds at most one scripted event to the node, runs one
//! scheduler tick, then lets virtual time pass for as long as the tick's
//! request poll would have waited.

use crate::config::{ConfigError, NodeConfig};
use crate::script::{EventScript, ScriptError, ScriptedEvent};
use node_api::{ClientRequest, Response, SchedulerStatus};
use services_scheduler::{Scheduler, SchedulerError, ShutdownReport, StopHandle, TickReport};
use sim_node::SimNode;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Daemon error types
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// Daemon runtime configuration
#[derive(Debug, Clone, Default)]
pub struct DaemonConfig {
    /// Optional event script
    pub script: Option<String>,
    /// Maximum ticks to run (0 = unlimited)
    pub max_ticks: u64,
    /// Whether to exit once the queue is empty and nothing is left to do
    pub exit_on_idle: bool,
}

/// Why the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A client or the stop handle asked the scheduler to stop
    Requested,
    /// `max_ticks` was reached
    MaxTicks,
    /// Nothing left to do and `exit_on_idle` was set
    Idle,
}

/// Result of a complete run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub reason: StopReason,
    pub shutdown: ShutdownReport,
    /// Last status a scripted `status` event received
    pub last_status: Option<SchedulerStatus>,
}

/// Daemon runtime
pub struct DaemonRuntime {
    config: DaemonConfig,
    node: SimNode,
    scheduler: Scheduler,
    script: Option<EventScript>,
    responses_seen: usize,
    last_status: Option<SchedulerStatus>,
}

impl DaemonRuntime {
    /// Builds the node described by `node_config` and starts the scheduler on it
    pub fn new(node_config: &NodeConfig, config: DaemonConfig) -> Result<Self, DaemonError> {
        let script = config
            .script
            .as_deref()
            .map(EventScript::from_text)
            .transpose()?;

        let tree = node_config.build_tree()?;
        let mut node = SimNode::new(tree);
        node.membership.set_master(node_config.node.master);
        info!(
            services = node.tree.len() - 1,
            master = node_config.node.master,
            "Node assembled"
        );

        let scheduler = Scheduler::start(&node_config.scheduler, &mut node.runtime())?;

        Ok(Self {
            config,
            node,
            scheduler,
            script,
            responses_seen: 0,
            last_status: None,
        })
    }

    /// Returns the simulated node
    pub fn node(&self) -> &SimNode {
        &self.node
    }

    /// Returns the scheduler
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns a handle that stops the loop after the current step
    pub fn stop_handle(&self) -> StopHandle {
        self.scheduler.stop_handle()
    }

    /// Feeds the next scripted event, then runs one tick
    ///
    /// A `settle` event stays at the front of the script while sequences
    /// are queued.
    pub fn step(&mut self) -> TickReport {
        let pending = self.scheduler.context().pending_sequences();
        if let Some(script) = self.script.as_mut() {
            let held = pending > 0 && script.peek() == Some(&ScriptedEvent::Settle);
            if !held {
                if let Some(event) = script.next_event() {
                    self.apply_event(event);
                }
            }
        }

        let report = self.scheduler.tick(&mut self.node.runtime());
        self.node.clock.advance(report.poll_timeout);
        self.log_responses();
        report
    }

    /// Runs until the scheduler stops, `max_ticks` is reached, or the node
    /// goes idle with `exit_on_idle` set; then shuts the scheduler down
    pub fn run(mut self) -> RunSummary {
        info!(
            max_ticks = self.config.max_ticks,
            exit_on_idle = self.config.exit_on_idle,
            "Daemon loop starting"
        );

        let reason = loop {
            if !self.scheduler.is_running() {
                break StopReason::Requested;
            }
            if self.config.max_ticks > 0 && self.scheduler.ticks() >= self.config.max_ticks {
                break StopReason::MaxTicks;
            }

            let report = self.step();
            if self.config.exit_on_idle && self.is_idle(&report) {
                break StopReason::Idle;
            }
        };

        info!(reason = ?reason, "Daemon loop finished");
        let shutdown = self.scheduler.shutdown(&mut self.node.runtime());
        RunSummary {
            reason,
            shutdown,
            last_status: self.last_status,
        }
    }

    /// Checks if the queue is empty and every scripted event was applied
    pub fn is_settled(&self) -> bool {
        self.scheduler.context().pending_sequences() == 0
            && self.script.as_ref().map_or(true, EventScript::is_exhausted)
    }

    fn is_idle(&self, report: &TickReport) -> bool {
        !report.did_work && report.requests_handled == 0 && self.is_settled()
    }

    fn apply_event(&mut self, event: ScriptedEvent) {
        debug!(event = ?event, "Applying scripted event");
        match event {
            ScriptedEvent::Wait(delay) => self.node.clock.advance(delay),
            ScriptedEvent::Settle => {}
            ScriptedEvent::Crash(name) => match self.node.tree.find(&name) {
                Some(id) => self.node.processes().crash(id),
                None => warn!(service = %name, "Scripted crash names an unknown service"),
            },
            ScriptedEvent::MasterRole(promoting) => {
                self.node.membership.set_master(promoting);
                self.node
                    .server
                    .submit(ClientRequest::ChangeMasterRole { promoting });
            }
            ScriptedEvent::Groups { add, filter } => {
                self.node
                    .server
                    .submit(ClientRequest::ChangeAllowedGroups { add, filter });
            }
            ScriptedEvent::Status => {
                self.node.server.submit(ClientRequest::Status);
            }
            ScriptedEvent::Shutdown => {
                self.node.server.submit(ClientRequest::Shutdown);
            }
        }
    }

    fn log_responses(&mut self) {
        let responses = self.node.server.responses();
        for (id, response) in &responses[self.responses_seen..] {
            match response {
                Response::Ack => info!(request_id = id.0, "Request acknowledged"),
                Response::Rejected { reason } => {
                    warn!(request_id = id.0, reason = %reason, "Request rejected")
                }
                Response::Status(status) => {
                    info!(
                        request_id = id.0,
                        state = ?status.state,
                        allowed_groups = %status.allowed_groups,
                        pending_sequences = status.pending_sequences,
                        ticks = status.ticks,
                        "Scheduler status"
                    );
                    self.last_status = Some(status.clone());
                }
            }
        }
        self.responses_seen = responses.len();
    }
}
