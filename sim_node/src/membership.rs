//! Simulated cluster membership

use node_api::ClusterMembership;

/// Membership of a single simulated node
#[derive(Debug, Clone, Default)]
pub struct SimMembership {
    master: bool,
    notifications: usize,
    torn_down: bool,
}

impl SimMembership {
    pub fn new(master: bool) -> Self {
        Self {
            master,
            notifications: 0,
            torn_down: false,
        }
    }

    /// Changes the master role as the cluster would on an election
    pub fn set_master(&mut self, master: bool) {
        self.master = master;
    }

    /// Returns how many times the mailbox was notified
    pub fn notifications(&self) -> usize {
        self.notifications
    }

    /// Checks if membership resources were released
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl ClusterMembership for SimMembership {
    fn is_master(&self) -> bool {
        self.master
    }

    fn notify_mailbox(&mut self) {
        self.notifications += 1;
    }

    fn teardown(&mut self) {
        self.torn_down = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_records_calls() {
        let mut membership = SimMembership::new(false);
        assert!(!membership.is_master());

        membership.set_master(true);
        membership.notify_mailbox();
        membership.notify_mailbox();
        membership.teardown();

        assert!(membership.is_master());
        assert_eq!(membership.notifications(), 2);
        assert!(membership.is_torn_down());
    }
}
