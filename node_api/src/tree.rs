//! Service tree interface

use crate::error::TreeError;
use crate::service::Service;
use core_types::{Domain, Filter, ServiceId, WalkOrder};

/// Token for a lock held over a tree domain
///
/// A lock is returned by [`ServiceTree::lock`] and must be handed back to
/// [`ServiceTree::unlock`]; it is deliberately not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct DomainLock {
    id: u64,
    node: ServiceId,
    domain: Domain,
    filter: Filter,
    exclusive: bool,
}

impl DomainLock {
    /// Creates a lock token (called by tree implementations)
    pub fn new(id: u64, node: ServiceId, domain: Domain, filter: Filter, exclusive: bool) -> Self {
        Self {
            id,
            node,
            domain,
            filter,
            exclusive,
        }
    }

    /// Returns the tree-assigned lock ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the scope node
    pub fn node(&self) -> ServiceId {
        self.node
    }

    /// Returns the locked domain
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Returns the filter the lock was taken for
    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Checks if the lock excludes every other lock on the domain
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }
}

/// A walkable tree of managed services
///
/// The representation is up to the implementation; the scheduler only needs
/// to resolve domains, visit services, and lock domains while it builds
/// sequences over them.
pub trait ServiceTree {
    /// Returns the root node
    fn root(&self) -> ServiceId;

    /// Looks up a service
    fn service(&self, id: ServiceId) -> Option<&Service>;

    /// Looks up a service mutably
    fn service_mut(&mut self, id: ServiceId) -> Option<&mut Service>;

    /// Resolves `(node, domain)` into service IDs in the given order
    fn members(
        &self,
        node: ServiceId,
        domain: Domain,
        order: WalkOrder,
    ) -> Result<Vec<ServiceId>, TreeError>;

    /// Visits every service of `(node, domain)` parents-first
    fn walk(
        &mut self,
        node: ServiceId,
        domain: Domain,
        visitor: &mut dyn FnMut(&mut Service),
    ) -> Result<(), TreeError> {
        for id in self.members(node, domain, WalkOrder::Normal)? {
            if let Some(service) = self.service_mut(id) {
                visitor(service);
            }
        }
        Ok(())
    }

    /// Locks `(node, domain)` for `filter`
    ///
    /// Shared locks coexist; an exclusive lock conflicts with any
    /// overlapping lock.
    fn lock(
        &mut self,
        node: ServiceId,
        domain: Domain,
        filter: Filter,
        exclusive: bool,
    ) -> Result<DomainLock, TreeError>;

    /// Releases a lock previously returned by [`ServiceTree::lock`]
    fn unlock(&mut self, lock: DomainLock);
}
