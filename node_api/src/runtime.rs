//! Borrowed bundle of node collaborators

use crate::clock::Clock;
use crate::membership::ClusterMembership;
use crate::sequence::SequenceFactory;
use crate::server::RequestServer;
use crate::supervision::{HealthMonitor, ProcessSupervisor};
use crate::tree::ServiceTree;

/// Every collaborator the scheduler needs for one call
///
/// The scheduler never owns its collaborators; hosts lend them for the
/// duration of a `start`, `tick` or `shutdown` call.
pub struct NodeRuntime<'a> {
    pub tree: &'a mut dyn ServiceTree,
    pub factory: &'a mut dyn SequenceFactory,
    pub supervisor: &'a mut dyn ProcessSupervisor,
    pub monitor: &'a mut dyn HealthMonitor,
    pub server: &'a mut dyn RequestServer,
    pub membership: &'a mut dyn ClusterMembership,
    pub clock: &'a dyn Clock,
}
