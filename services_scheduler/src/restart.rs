//! Automatic restart of disabled services
//!
//! Each restart request consults the service's [`node_api::RestartHistory`].
//! A permitted restart re-runs the whole bring-up of the service's subtree
//! (stop bottom-up, start, transition to running). A refused one quarantines
//! the subtree: it is stopped and left stopped.

use crate::scheduler::Scheduler;
use core_types::{Domain, Filter, ServiceId, ServiceState};
use node_api::{NodeRuntime, RestartVerdict, SequenceKind, SequenceRequest, SequenceScope};
use tracing::{info, warn};

impl Scheduler {
    /// Applies the restart policy to `service`
    ///
    /// Returns `None` if the service is not in the tree.
    pub fn apply_restart_policy(
        &mut self,
        rt: &mut NodeRuntime<'_>,
        service: ServiceId,
    ) -> Option<RestartVerdict> {
        let now = rt.clock.now();
        let verdict = rt
            .tree
            .service_mut(service)?
            .restarts_mut()
            .record_restart(now);

        match verdict {
            RestartVerdict::Permit { slot } => {
                info!(service = %service, slot, "Restarting service");
                self.restart(rt, service);
            }
            RestartVerdict::Quarantine { slot, last_restart } => {
                warn!(
                    service = %service,
                    slot,
                    last_restart_ns = last_restart.as_nanos(),
                    "Restart budget exhausted; quarantining service"
                );
                self.quarantine(rt, service);
            }
        }
        Some(verdict)
    }

    fn restart(&mut self, rt: &mut NodeRuntime<'_>, service: ServiceId) {
        let scope = SequenceScope::new(service, Domain::Subtree, self.active_filter(rt));

        self.enqueue(rt, SequenceRequest::new(scope, SequenceKind::Stop).bottom_up());
        self.enqueue(rt, SequenceRequest::new(scope, SequenceKind::Start));
        self.enqueue(
            rt,
            SequenceRequest::new(scope, SequenceKind::TransitionTo(ServiceState::Running)),
        );
    }

    fn quarantine(&mut self, rt: &mut NodeRuntime<'_>, service: ServiceId) {
        let mut filter = Filter::ALL_GROUPS | Filter::ANY_NODE;
        if rt.membership.is_master() {
            filter |= Filter::MASTER;
        }

        let lock = match rt.tree.lock(service, Domain::Subtree, filter, true) {
            Ok(lock) => lock,
            Err(err) => {
                warn!(service = %service, error = %err, "Could not lock subtree for quarantine");
                return;
            }
        };

        let scope = SequenceScope::new(service, Domain::Subtree, filter);
        self.enqueue(rt, SequenceRequest::new(scope, SequenceKind::Stop).bottom_up());
        rt.tree.unlock(lock);
    }
}
