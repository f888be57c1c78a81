//! Scheduler loop: startup, tick and shutdown

use crate::config::SchedulerConfig;
use crate::context::{SchedulerContext, TeardownCounts};
use crate::error::SchedulerError;
use crate::lifecycle::StopHandle;
use core_types::{Domain, Duration, Filter, SequenceId, ServiceState};
use node_api::{
    ErrorKind, ErrorReport, NodeRuntime, SchedulerState, SchedulerStatus, Sequence,
    SequenceKind, SequenceRequest, SequenceScope, SequenceStatus, SequenceSummary, Service, ServiceTree,
};
use tracing::{debug, error, info, warn};

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// The head sequence made progress or a report triggered the restart policy
    pub did_work: bool,
    /// Timeout passed to the request server poll
    pub poll_timeout: Duration,
    /// Sequence retired this tick
    pub retired: Option<SequenceId>,
    /// Error reports drained this tick
    pub reports_handled: usize,
    /// Client requests answered this tick
    pub requests_handled: usize,
}

/// Summary of a completed shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Ticks run over the scheduler's lifetime
    pub ticks: u64,
    /// Sequences and reports left in the queues
    pub leftovers: TeardownCounts,
}

/// Per-node service lifecycle scheduler
///
/// Single-threaded and cooperative: every call runs to completion and only
/// the head of the sequence queue is stepped per tick.
#[derive(Debug)]
pub struct Scheduler {
    pub(crate) context: SchedulerContext,
    lifecycle: StopHandle,
    idle_timeout: Duration,
    ticks: u64,
}

impl Scheduler {
    /// Starts the scheduler
    ///
    /// Allocates the queues, enqueues the bring-up sequences for the whole
    /// tree and starts the request server. On error nothing keeps running.
    pub fn start(
        config: &SchedulerConfig,
        rt: &mut NodeRuntime<'_>,
    ) -> Result<Self, SchedulerError> {
        let allowed_groups = config.validate()?;
        let context = SchedulerContext::allocate(
            allowed_groups,
            config.port,
            config.max_pending_sequences,
        )
        .map_err(|err| {
            error!(error = %err, "Failed to allocate scheduler queues");
            SchedulerError::from(err)
        })?;

        let mut scheduler = Self {
            context,
            lifecycle: StopHandle::new(),
            idle_timeout: config.idle_poll_timeout(),
            ticks: 0,
        };

        let filter = scheduler.active_filter(rt);
        let root = rt.tree.root();
        info!(filter = %filter, "Bringing up service tree");

        match rt.tree.lock(root, Domain::Subtree, filter, false) {
            Ok(lock) => {
                let scope = SequenceScope::new(root, Domain::Subtree, filter);
                scheduler.enqueue(rt, SequenceRequest::new(scope, SequenceKind::Start));
                scheduler.enqueue(
                    rt,
                    SequenceRequest::new(scope, SequenceKind::TransitionTo(ServiceState::Running)),
                );
                rt.tree.unlock(lock);
            }
            Err(err) => {
                warn!(error = %err, "Could not lock service tree; skipping bring-up");
            }
        }

        match rt.server.start(config.port) {
            Ok(handle) => {
                info!(port = config.port, handle = %handle, "Scheduler started");
                scheduler.context.server = Some(handle);
                Ok(scheduler)
            }
            Err(err) => {
                error!(port = config.port, error = %err, "Failed to start request server");
                let leftovers = scheduler.context.free();
                debug!(
                    abandoned = leftovers.abandoned_sequences,
                    "Released queues after failed startup"
                );
                Err(SchedulerError::from(err))
            }
        }
    }

    /// Runs one iteration of the loop
    pub fn tick(&mut self, rt: &mut NodeRuntime<'_>) -> TickReport {
        self.ticks += 1;

        let mut did_work = self.advance_head(rt.tree);
        let retired = self.retire_head(rt.tree);

        rt.supervisor.poll_exits(&mut self.context.errors);
        rt.monitor.poll(&mut self.context.errors);

        let mut reports_handled = 0;
        while let Some(report) = self.context.errors.extract_first() {
            reports_handled += 1;
            if self.handle_report(rt, report) {
                did_work = true;
            }
        }

        let poll_timeout = if did_work {
            rt.membership.notify_mailbox();
            Duration::ZERO
        } else {
            self.idle_timeout
        };
        let requests_handled = self.serve_requests(rt, poll_timeout);

        TickReport {
            did_work,
            poll_timeout,
            retired,
            reports_handled,
            requests_handled,
        }
    }

    /// Ticks until a stop is requested, then shuts down
    pub fn run(mut self, rt: &mut NodeRuntime<'_>) -> ShutdownReport {
        while self.lifecycle.is_running() {
            self.tick(rt);
        }
        self.shutdown(rt)
    }

    /// Tears the scheduler down
    ///
    /// In-flight sequences are abandoned without compensation.
    pub fn shutdown(self, rt: &mut NodeRuntime<'_>) -> ShutdownReport {
        self.lifecycle.stop();

        if let Some(handle) = self.context.server {
            rt.server.close(handle);
        }
        let leftovers = self.context.free();
        rt.membership.teardown();
        self.lifecycle.mark_stopped();

        info!(
            ticks = self.ticks,
            abandoned_sequences = leftovers.abandoned_sequences,
            dropped_reports = leftovers.dropped_reports,
            "Scheduler stopped"
        );
        ShutdownReport {
            ticks: self.ticks,
            leftovers,
        }
    }

    /// Returns a handle that can stop this scheduler
    pub fn stop_handle(&self) -> StopHandle {
        self.lifecycle.clone()
    }

    /// Requests a stop; the current tick still completes
    pub fn stop(&self) {
        if self.lifecycle.stop() {
            info!("Scheduler stop requested");
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.lifecycle.state()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn context(&self) -> &SchedulerContext {
        &self.context
    }

    /// Returns a snapshot of the scheduler
    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            state: self.state(),
            allowed_groups: self.context.allowed_groups,
            pending_sequences: self.context.pending_sequences(),
            head: self.context.head().map(summarize),
            ticks: self.ticks,
        }
    }

    /// Filter for sequences built now: allowed groups on any node, plus
    /// master-only services while this node is master
    pub(crate) fn active_filter(&self, rt: &NodeRuntime<'_>) -> Filter {
        let mut filter = self.context.allowed_groups | Filter::ANY_NODE;
        if rt.membership.is_master() {
            filter |= Filter::MASTER;
        }
        filter
    }

    /// Builds a sequence and appends it to the queue
    ///
    /// Build failures are logged and skipped.
    pub(crate) fn enqueue(&mut self, rt: &mut NodeRuntime<'_>, request: SequenceRequest) -> bool {
        let kind = request.kind;
        let scope = request.scope;

        let sequence = match rt.factory.build(rt.tree, request) {
            Ok(sequence) => sequence,
            Err(err) => {
                warn!(kind = %kind, node = %scope.node, error = %err, "Failed to build sequence");
                return false;
            }
        };

        let id = sequence.id();
        match self.context.sequences.add(sequence) {
            Ok(()) => {
                debug!(
                    sequence = %id,
                    kind = %kind,
                    node = %scope.node,
                    domain = %scope.domain,
                    filter = %scope.filter,
                    "Enqueued sequence"
                );
                true
            }
            Err(err) => {
                // The factory already counted the sequence; undo that.
                error!(sequence = %id, error = %err, "Failed to enqueue sequence");
                release_operations(rt.tree, scope);
                false
            }
        }
    }

    fn advance_head(&mut self, tree: &mut dyn ServiceTree) -> bool {
        match self.context.sequences.peek_first_mut() {
            Some(head) => head.step(tree),
            None => false,
        }
    }

    fn retire_head(&mut self, tree: &mut dyn ServiceTree) -> Option<SequenceId> {
        let completed = self
            .context
            .sequences
            .peek_first()
            .map(|head| head.status() == SequenceStatus::Completed)
            .unwrap_or(false);
        if !completed {
            return None;
        }

        let sequence = self.context.sequences.extract_first()?;
        let id = sequence.id();
        let released = release_operations(tree, sequence.scope());
        debug!(
            sequence = %id,
            kind = %sequence.kind(),
            released,
            "Retired sequence"
        );
        Some(id)
    }

    fn handle_report(&mut self, rt: &mut NodeRuntime<'_>, report: ErrorReport) -> bool {
        match report.kind {
            ErrorKind::DisabledService => {
                let Some(service) = rt.tree.service(report.service) else {
                    warn!(service = %report.service, "Report for unknown service dropped");
                    return false;
                };
                if !service.is_idle() {
                    debug!(
                        service = %report.service,
                        ongoing = service.ongoing_operations(),
                        "Service busy; skipping report"
                    );
                    return false;
                }
                self.apply_restart_policy(rt, report.service);
                true
            }
            ErrorKind::Unrecognized(code) => {
                warn!(service = %report.service, code, "Unrecognized report kind dropped");
                false
            }
        }
    }
}

/// Decrements the ongoing-operations counter of every service a sequence
/// selects; returns how many were decremented
pub(crate) fn release_operations(tree: &mut dyn ServiceTree, scope: SequenceScope) -> usize {
    let mut released = 0;
    let result = tree.walk(scope.node, scope.domain, &mut |service: &mut Service| {
        if !scope.filter.selects(service.filter()) {
            return;
        }
        if service.release_operation() {
            released += 1;
        } else {
            warn!(service = %service.id(), "Ongoing operations already zero");
        }
    });
    if let Err(err) = result {
        warn!(node = %scope.node, error = %err, "Could not walk retired scope");
    }
    released
}

fn summarize(sequence: &dyn Sequence) -> SequenceSummary {
    SequenceSummary {
        id: sequence.id(),
        kind: sequence.kind(),
        scope: sequence.scope(),
        status: sequence.status(),
    }
}
