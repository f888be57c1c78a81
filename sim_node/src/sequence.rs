//! Simulated sequences and their factory
//!
//! A [`SimSequence`] resolves its scope once, at build time, into the list of
//! participating services and then acts on one of them per step. Every
//! build and every step is recorded so tests can check exactly what the
//! scheduler asked for and what it ran.

use crate::fault_injection::FactoryFault;
use crate::processes::{ProcessState, SimProcesses};
use core_types::{SequenceId, ServiceId, ServiceState, WalkOrder};
use node_api::{
    CompletionHook, Sequence, SequenceError, SequenceFactory, SequenceKind, SequenceRequest,
    SequenceScope, SequenceStatus, ServiceTree,
};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// One successful build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildRecord {
    pub id: SequenceId,
    pub kind: SequenceKind,
    pub scope: SequenceScope,
    pub order: WalkOrder,
    /// Number of services the sequence acts on
    pub participants: usize,
}

/// Shared record of every step taken by any sequence of a factory
#[derive(Debug, Clone, Default)]
pub struct StepLog {
    entries: Rc<RefCell<Vec<(SequenceId, ServiceId)>>>,
}

impl StepLog {
    fn record(&self, sequence: SequenceId, service: ServiceId) {
        self.entries.borrow_mut().push((sequence, service));
    }

    /// Returns every `(sequence, service)` step, oldest first
    pub fn entries(&self) -> Vec<(SequenceId, ServiceId)> {
        self.entries.borrow().clone()
    }

    /// Returns the sequences that were stepped, in step order
    pub fn stepped_sequences(&self) -> Vec<SequenceId> {
        self.entries.borrow().iter().map(|(seq, _)| *seq).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// A sequence over a pre-resolved list of services
pub struct SimSequence {
    id: SequenceId,
    kind: SequenceKind,
    scope: SequenceScope,
    status: SequenceStatus,
    participants: Vec<ServiceId>,
    next: usize,
    on_complete: Option<CompletionHook>,
    processes: SimProcesses,
    log: StepLog,
}

impl SimSequence {
    /// Returns the services this sequence acts on, in execution order
    pub fn participants(&self) -> &[ServiceId] {
        &self.participants
    }

    fn complete(&mut self) {
        self.status = SequenceStatus::Completed;
        if let Some(hook) = self.on_complete.take() {
            hook(self.id);
        }
    }

    fn apply(&self, tree: &mut dyn ServiceTree, target: ServiceId) {
        let Some(service) = tree.service_mut(target) else {
            debug!(service = %target, "Service vanished before its step");
            return;
        };

        match self.kind {
            SequenceKind::Start => {
                service.set_state(ServiceState::Starting);
                match self.processes.start(target) {
                    ProcessState::Running => service.set_state(ServiceState::Standby),
                    _ => service.set_state(ServiceState::Failed),
                }
            }
            SequenceKind::Stop => {
                self.processes.stop(target);
                service.set_state(ServiceState::Stopped);
            }
            SequenceKind::TransitionTo(state) => {
                if service.state() != ServiceState::Failed {
                    service.set_state(state);
                }
            }
        }
    }
}

impl Sequence for SimSequence {
    fn id(&self) -> SequenceId {
        self.id
    }

    fn kind(&self) -> SequenceKind {
        self.kind
    }

    fn scope(&self) -> SequenceScope {
        self.scope
    }

    fn status(&self) -> SequenceStatus {
        self.status
    }

    fn step(&mut self, tree: &mut dyn ServiceTree) -> bool {
        if self.status == SequenceStatus::Completed {
            return false;
        }

        let Some(target) = self.participants.get(self.next).copied() else {
            // Nothing selected: complete without doing work.
            self.complete();
            return false;
        };

        self.status = SequenceStatus::Running;
        self.apply(tree, target);
        self.log.record(self.id, target);
        self.next += 1;

        if self.next == self.participants.len() {
            self.complete();
        }
        true
    }
}

impl fmt::Debug for SimSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimSequence")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("scope", &self.scope)
            .field("status", &self.status)
            .field("participants", &self.participants)
            .field("next", &self.next)
            .finish()
    }
}

/// Factory building [`SimSequence`]s over the shared process table
#[derive(Debug)]
pub struct SimSequenceFactory {
    processes: SimProcesses,
    faults: Vec<FactoryFault>,
    refuse_next: usize,
    builds: Vec<BuildRecord>,
    refusals: usize,
    log: StepLog,
}

impl SimSequenceFactory {
    /// Creates a factory with no injected faults
    pub fn new(processes: SimProcesses) -> Self {
        Self {
            processes,
            faults: Vec::new(),
            refuse_next: 0,
            builds: Vec::new(),
            refusals: 0,
            log: StepLog::default(),
        }
    }

    /// Applies factory faults
    pub fn with_faults(mut self, faults: Vec<FactoryFault>) -> Self {
        for fault in &faults {
            if let FactoryFault::RefuseNext { count } = fault {
                self.refuse_next += count;
            }
        }
        self.faults = faults;
        self
    }

    /// Refuses the next `count` builds
    pub fn refuse_next(&mut self, count: usize) {
        self.refuse_next += count;
    }

    /// Returns every successful build, oldest first
    pub fn builds(&self) -> &[BuildRecord] {
        &self.builds
    }

    /// Returns how many builds were refused
    pub fn refusals(&self) -> usize {
        self.refusals
    }

    /// Returns the step log shared by every sequence built here
    pub fn step_log(&self) -> &StepLog {
        &self.log
    }

    fn check_faults(&mut self, kind: SequenceKind) -> Result<(), SequenceError> {
        if self.refuse_next > 0 {
            self.refuse_next -= 1;
            return Err(SequenceError::Refused("injected refusal".to_string()));
        }

        let refused_kind = self
            .faults
            .iter()
            .any(|fault| matches!(fault, FactoryFault::RefuseKind { kind: k } if *k == kind));
        if refused_kind {
            return Err(SequenceError::Refused(format!("{} sequences refused", kind)));
        }
        Ok(())
    }
}

impl SequenceFactory for SimSequenceFactory {
    fn build(
        &mut self,
        tree: &mut dyn ServiceTree,
        request: SequenceRequest,
    ) -> Result<Box<dyn Sequence>, SequenceError> {
        if let Err(err) = self.check_faults(request.kind) {
            self.refusals += 1;
            return Err(err);
        }

        let scope = request.scope;
        let participants: Vec<ServiceId> = tree
            .members(scope.node, scope.domain, request.order)?
            .into_iter()
            .filter(|id| {
                tree.service(*id)
                    .map(|service| scope.filter.selects(service.filter()))
                    .unwrap_or(false)
            })
            .collect();

        for id in &participants {
            if let Some(service) = tree.service_mut(*id) {
                service.acquire_operation();
            }
        }

        let id = SequenceId::new();
        self.builds.push(BuildRecord {
            id,
            kind: request.kind,
            scope,
            order: request.order,
            participants: participants.len(),
        });
        debug!(
            sequence = %id,
            kind = %request.kind,
            participants = participants.len(),
            "Built sequence"
        );

        Ok(Box::new(SimSequence {
            id,
            kind: request.kind,
            scope,
            status: SequenceStatus::Pending,
            participants,
            next: 0,
            on_complete: request.on_complete,
            processes: self.processes.clone(),
            log: self.log.clone(),
        }))
    }
}
