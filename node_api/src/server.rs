//! Request server interface
//!
//! The request server is how clients reach the scheduler. Only the typed
//! request/response surface lives here; framing and transport belong to the
//! server implementation.

use crate::error::ServerError;
use crate::sequence::{SequenceKind, SequenceScope, SequenceStatus};
use core_types::{Duration, Filter, SequenceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a started request server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerHandle(u64);

impl ServerHandle {
    /// Creates a handle (called by server implementations)
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw handle value
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Server({})", self.0)
    }
}

/// Identifier correlating a response with its request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// Work a client asks the scheduler to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Add (`add = true`) or remove groups from the allowed set
    ChangeAllowedGroups { add: bool, filter: Filter },
    /// This node gained (`promoting = true`) or lost the master role
    ChangeMasterRole { promoting: bool },
    /// Report the scheduler status
    Status,
    /// Stop the scheduler loop
    Shutdown,
}

/// A request received by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingRequest {
    /// Correlation ID
    pub id: RequestId,
    /// The request itself
    pub request: ClientRequest,
}

/// Lifecycle of the scheduler loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    /// Ticking
    Running,
    /// A stop was requested; the current tick finishes, then shutdown runs
    Stopping,
    /// Shutdown complete
    Stopped,
}

/// Summary of one queued sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSummary {
    pub id: SequenceId,
    pub kind: SequenceKind,
    pub scope: SequenceScope,
    pub status: SequenceStatus,
}

/// Snapshot of the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// Loop lifecycle
    pub state: SchedulerState,
    /// Groups allowed for newly built sequences
    pub allowed_groups: Filter,
    /// Number of queued sequences, head included
    pub pending_sequences: usize,
    /// The sequence currently being advanced
    pub head: Option<SequenceSummary>,
    /// Ticks run so far
    pub ticks: u64,
}

/// Reply to a client request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// The request was applied
    Ack,
    /// Current status
    Status(SchedulerStatus),
    /// The request was not applied
    Rejected { reason: String },
}

/// Server through which clients submit requests
pub trait RequestServer {
    /// Starts listening on `port`
    fn start(&mut self, port: u16) -> Result<ServerHandle, ServerError>;

    /// Waits up to `timeout` for requests; a zero timeout never blocks
    fn poll(
        &mut self,
        handle: &ServerHandle,
        timeout: Duration,
    ) -> Result<Vec<IncomingRequest>, ServerError>;

    /// Sends the reply for request `id`
    fn respond(
        &mut self,
        handle: &ServerHandle,
        id: RequestId,
        response: Response,
    ) -> Result<(), ServerError>;

    /// Stops listening and releases the handle
    fn close(&mut self, handle: ServerHandle);
}
