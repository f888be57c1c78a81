//! Cluster membership

/// Cluster-membership facilities of the local node
pub trait ClusterMembership {
    /// Checks if this node currently holds the master role
    fn is_master(&self) -> bool;

    /// Wakes the inter-node mailbox after a busy tick
    fn notify_mailbox(&mut self);

    /// Releases membership resources at scheduler shutdown
    fn teardown(&mut self);
}
