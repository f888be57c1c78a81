//! Sequences and the factory that builds them
//!
//! A sequence is a resumable unit of work applying one operation across the
//! services of a scope. The factory builds it (and, as a side effect, counts
//! it against every participating service); the scheduler steps it and
//! retires it.

use crate::error::SequenceError;
use crate::tree::ServiceTree;
use core_types::{Domain, Filter, SequenceId, ServiceId, ServiceState, WalkOrder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation applied by a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceKind {
    /// Bring services up
    Start,
    /// Take services down
    Stop,
    /// Drive services to a target state
    TransitionTo(ServiceState),
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceKind::Start => write!(f, "start"),
            SequenceKind::Stop => write!(f, "stop"),
            SequenceKind::TransitionTo(state) => write!(f, "transition-to-{}", state),
        }
    }
}

/// Progress of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceStatus {
    /// Built but never stepped
    Pending,
    /// Stepped at least once, more work remains
    Running,
    /// All work done; ready to be retired
    Completed,
}

/// The services a sequence acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceScope {
    /// Root of the acted-on subtree
    pub node: ServiceId,
    /// Relation of the tree around `node`
    pub domain: Domain,
    /// Participants selector
    pub filter: Filter,
}

impl SequenceScope {
    /// Creates a scope
    pub fn new(node: ServiceId, domain: Domain, filter: Filter) -> Self {
        Self {
            node,
            domain,
            filter,
        }
    }
}

/// Callback run by a sequence when it completes
pub type CompletionHook = Box<dyn FnOnce(SequenceId)>;

/// Everything a factory needs to build a sequence
pub struct SequenceRequest {
    /// Services to act on
    pub scope: SequenceScope,
    /// Operation to apply
    pub kind: SequenceKind,
    /// Execution order over the scope
    pub order: WalkOrder,
    /// Optional completion callback
    pub on_complete: Option<CompletionHook>,
}

impl SequenceRequest {
    /// Creates a request executed parents-first
    pub fn new(scope: SequenceScope, kind: SequenceKind) -> Self {
        Self {
            scope,
            kind,
            order: WalkOrder::Normal,
            on_complete: None,
        }
    }

    /// Executes children before parents
    pub fn bottom_up(mut self) -> Self {
        self.order = WalkOrder::BottomUp;
        self
    }

    /// Attaches a completion callback
    pub fn with_on_complete(mut self, hook: CompletionHook) -> Self {
        self.on_complete = Some(hook);
        self
    }
}

impl fmt::Debug for SequenceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceRequest")
            .field("scope", &self.scope)
            .field("kind", &self.kind)
            .field("order", &self.order)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// A resumable unit of work
pub trait Sequence {
    /// Returns the sequence ID
    fn id(&self) -> SequenceId;

    /// Returns the operation this sequence applies
    fn kind(&self) -> SequenceKind;

    /// Returns the services this sequence acts on
    fn scope(&self) -> SequenceScope;

    /// Returns the current progress
    fn status(&self) -> SequenceStatus;

    /// Runs one step; returns `true` if the step performed real work
    fn step(&mut self, tree: &mut dyn ServiceTree) -> bool;
}

/// Builds sequences over the service tree
///
/// A successful build counts the new sequence against every service it
/// selects, incrementing each one's ongoing-operations counter exactly once.
pub trait SequenceFactory {
    /// Builds a sequence for `request`
    fn build(
        &mut self,
        tree: &mut dyn ServiceTree,
        request: SequenceRequest,
    ) -> Result<Box<dyn Sequence>, SequenceError>;
}
