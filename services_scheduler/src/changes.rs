//! Group and role change requests

use crate::error::SchedulerError;
use crate::scheduler::Scheduler;
use core_types::{Domain, Filter, ServiceState};
use node_api::{NodeRuntime, SequenceKind, SequenceRequest, SequenceScope};
use tracing::{debug, info, warn};

impl Scheduler {
    /// Adds groups to, or removes them from, the allowed set
    ///
    /// Role bits in `filter` are ignored. Only sequences built afterwards
    /// see the change.
    pub fn change_allowed_groups(&mut self, add: bool, filter: Filter) -> Filter {
        let groups = filter.groups();
        if groups != filter {
            debug!(filter = %filter, "Ignoring role bits in group change");
        }

        let current = self.context.allowed_groups;
        let allowed = if add {
            current | groups
        } else {
            current.without(groups)
        };
        self.context.allowed_groups = allowed;
        info!(add, groups = %groups, allowed = %allowed, "Allowed groups changed");
        allowed
    }

    /// Starts or stops the master-only services after a role change
    ///
    /// Returns the number of sequences enqueued. Fails without enqueueing
    /// anything if the tree cannot be locked.
    pub fn change_master_role(
        &mut self,
        rt: &mut NodeRuntime<'_>,
        promoting: bool,
    ) -> Result<usize, SchedulerError> {
        if !self.is_running() {
            return Err(SchedulerError::Stopping);
        }

        let root = rt.tree.root();
        let filter = self.context.allowed_groups | Filter::MASTER;
        let lock = rt
            .tree
            .lock(root, Domain::Subtree, filter, true)
            .inspect_err(|err| warn!(error = %err, "Could not lock tree for role change"))?;

        let scope = SequenceScope::new(root, Domain::Subtree, filter);
        let requests = if promoting {
            vec![
                SequenceRequest::new(scope, SequenceKind::Start),
                SequenceRequest::new(scope, SequenceKind::TransitionTo(ServiceState::Running)),
            ]
        } else {
            vec![SequenceRequest::new(scope, SequenceKind::Stop).bottom_up()]
        };

        let mut enqueued = 0;
        for request in requests {
            if self.enqueue(rt, request) {
                enqueued += 1;
            }
        }
        rt.tree.unlock(lock);

        info!(promoting, enqueued, "Master role changed");
        Ok(enqueued)
    }
}
