//! In-memory service tree

use core_types::{Domain, Filter, ServiceId, WalkOrder};
use node_api::{DomainLock, RestartHistory, Service, ServiceTree, TreeError};
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
struct TreeNode {
    service: Service,
    parent: Option<ServiceId>,
    children: Vec<ServiceId>,
}

#[derive(Debug)]
struct HeldLock {
    id: u64,
    covered: HashSet<ServiceId>,
    exclusive: bool,
}

/// A lock that was granted, kept for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRecord {
    pub node: ServiceId,
    pub domain: Domain,
    pub filter: Filter,
    pub exclusive: bool,
}

/// Service tree held entirely in memory
///
/// The root is a structural node with an empty filter, so no sequence ever
/// selects it.
#[derive(Debug)]
pub struct MemoryServiceTree {
    root: ServiceId,
    nodes: HashMap<ServiceId, TreeNode>,
    held_locks: Vec<HeldLock>,
    lock_history: Vec<LockRecord>,
    next_lock_id: u64,
}

impl MemoryServiceTree {
    /// Creates a tree containing only a structural root
    pub fn new(root_name: &str) -> Self {
        let root = Service::new(root_name, Filter::NONE, RestartHistory::default());
        let root_id = root.id();
        let mut nodes = HashMap::new();
        nodes.insert(
            root_id,
            TreeNode {
                service: root,
                parent: None,
                children: Vec::new(),
            },
        );

        Self {
            root: root_id,
            nodes,
            held_locks: Vec::new(),
            lock_history: Vec::new(),
            next_lock_id: 1,
        }
    }

    /// Adds `service` as the last child of `parent`
    pub fn add_service(
        &mut self,
        parent: ServiceId,
        service: Service,
    ) -> Result<ServiceId, TreeError> {
        let id = service.id();
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(TreeError::UnknownService(parent))?;
        parent_node.children.push(id);

        self.nodes.insert(
            id,
            TreeNode {
                service,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Finds a service by name
    pub fn find(&self, name: &str) -> Option<ServiceId> {
        self.nodes
            .values()
            .find(|node| node.service.name() == name)
            .map(|node| node.service.id())
    }

    /// Returns the parent of `id`
    pub fn parent(&self, id: ServiceId) -> Option<ServiceId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    /// Returns the number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Checks if the tree holds only its root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Returns the number of locks currently held
    pub fn held_lock_count(&self) -> usize {
        self.held_locks.len()
    }

    /// Returns every lock granted so far, oldest first
    pub fn lock_history(&self) -> &[LockRecord] {
        &self.lock_history
    }

    fn collect_subtree(&self, node: ServiceId, order: WalkOrder, out: &mut Vec<ServiceId>) {
        let Some(entry) = self.nodes.get(&node) else {
            return;
        };
        if order == WalkOrder::Normal {
            out.push(node);
        }
        for child in &entry.children {
            self.collect_subtree(*child, order, out);
        }
        if order == WalkOrder::BottomUp {
            out.push(node);
        }
    }
}

impl ServiceTree for MemoryServiceTree {
    fn root(&self) -> ServiceId {
        self.root
    }

    fn service(&self, id: ServiceId) -> Option<&Service> {
        self.nodes.get(&id).map(|node| &node.service)
    }

    fn service_mut(&mut self, id: ServiceId) -> Option<&mut Service> {
        self.nodes.get_mut(&id).map(|node| &mut node.service)
    }

    fn members(
        &self,
        node: ServiceId,
        domain: Domain,
        order: WalkOrder,
    ) -> Result<Vec<ServiceId>, TreeError> {
        let entry = self
            .nodes
            .get(&node)
            .ok_or(TreeError::UnknownService(node))?;

        let mut members = Vec::new();
        match domain {
            Domain::ThisNode => members.push(node),
            Domain::Children => members.extend(entry.children.iter().copied()),
            Domain::Subtree => self.collect_subtree(node, order, &mut members),
        }
        Ok(members)
    }

    fn lock(
        &mut self,
        node: ServiceId,
        domain: Domain,
        filter: Filter,
        exclusive: bool,
    ) -> Result<DomainLock, TreeError> {
        let covered: HashSet<ServiceId> = self
            .members(node, domain, WalkOrder::Normal)?
            .into_iter()
            .collect();

        let conflict = self.held_locks.iter().any(|held| {
            (held.exclusive || exclusive) && !held.covered.is_disjoint(&covered)
        });
        if conflict {
            return Err(TreeError::LockConflict { node });
        }

        let id = self.next_lock_id;
        self.next_lock_id += 1;
        self.held_locks.push(HeldLock {
            id,
            covered,
            exclusive,
        });
        self.lock_history.push(LockRecord {
            node,
            domain,
            filter,
            exclusive,
        });

        Ok(DomainLock::new(id, node, domain, filter, exclusive))
    }

    fn unlock(&mut self, lock: DomainLock) {
        self.held_locks.retain(|held| held.id != lock.id());
    }
}
