use node_api::{ServerError, TreeError};
use thiserror::Error;
use work_list::WorkListError;

/// Scheduler errors
///
/// Only startup failures and rejected role changes surface as errors; every
/// other failure inside a tick is logged and skipped.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Failed to allocate scheduler queues: {0}")]
    QueueAllocation(#[from] WorkListError),

    #[error("Failed to start request server: {0}")]
    ServerStart(#[from] ServerError),

    #[error("Invalid scheduler configuration: {0}")]
    InvalidConfig(String),

    #[error("Service tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Scheduler is stopping")]
    Stopping,
}
