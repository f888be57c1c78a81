//! # Node API
//!
//! This crate defines the interface between the lifecycle scheduler and the
//! node it runs on.
//!
//! ## Philosophy
//!
//! The scheduler owns **orchestration**, never mechanism:
//! - The service tree is walked and locked through [`ServiceTree`]
//! - Units of work are built by a [`SequenceFactory`] and only stepped by the scheduler
//! - Failures arrive through [`ProcessSupervisor`] and [`HealthMonitor`]
//! - Client work arrives through a [`RequestServer`]
//! - Cluster role and inter-node notification go through [`ClusterMembership`]
//!
//! ## Design Goals
//!
//! 1. **Testability**: Every collaborator can be simulated in-process
//! 2. **Explicitness**: Time comes from a [`Clock`], never from ambient state
//! 3. **Single writer**: Only the scheduler mutates the per-service counters
//!    and restart history it depends on

pub mod clock;
pub mod error;
pub mod membership;
pub mod runtime;
pub mod sequence;
pub mod server;
pub mod service;
pub mod supervision;
pub mod tree;

pub use clock::{Clock, SystemClock};
pub use error::{SequenceError, ServerError, TreeError};
pub use membership::ClusterMembership;
pub use runtime::NodeRuntime;
pub use sequence::{
    CompletionHook, Sequence, SequenceFactory, SequenceKind, SequenceRequest, SequenceScope,
    SequenceStatus,
};
pub use server::{
    ClientRequest, IncomingRequest, RequestId, RequestServer, Response, SchedulerState,
    SchedulerStatus, SequenceSummary, ServerHandle,
};
pub use service::{RestartHistory, RestartVerdict, Service};
pub use supervision::{ErrorKind, ErrorQueue, ErrorReport, HealthMonitor, ProcessSupervisor};
pub use tree::{DomainLock, ServiceTree};
