//! Collaborator error types

use crate::server::ServerHandle;
use core_types::ServiceId;
use thiserror::Error;

/// Errors raised by a service tree
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The node is not part of the tree
    #[error("Unknown service: {0}")]
    UnknownService(ServiceId),

    /// The requested domain overlaps a conflicting lock
    #[error("Domain lock conflict at {node}")]
    LockConflict { node: ServiceId },
}

/// Errors raised while building a sequence
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SequenceError {
    /// The tree rejected the scope
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    /// The factory declined to build the sequence
    #[error("Sequence refused: {0}")]
    Refused(String),
}

/// Errors raised by a request server
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServerError {
    /// The listening port could not be bound
    #[error("Failed to bind port {port}: {reason}")]
    Bind { port: u16, reason: String },

    /// The handle does not belong to a started server
    #[error("Unknown server handle: {0}")]
    UnknownHandle(ServerHandle),

    /// A transport-level failure
    #[error("Transport error: {0}")]
    Transport(String),
}
