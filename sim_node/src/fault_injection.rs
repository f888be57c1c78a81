//! Deterministic fault injection for testing
//!
//! A [`FaultPlan`] describes, per test, which collaborator should misbehave
//! and how often. Faults are counted, never random.
//!
//! ## Example
//!
//! ```
//! use sim_node::fault_injection::{FactoryFault, FaultPlan, ServerFault};
//!
//! let plan = FaultPlan::new()
//!     .with_factory_fault(FactoryFault::RefuseNext { count: 1 })
//!     .with_server_fault(ServerFault::BindFailure);
//! assert_eq!(plan.factory_faults().len(), 1);
//! ```

use core_types::ServiceId;
use node_api::SequenceKind;

/// A fault injected into sequence building
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactoryFault {
    /// Refuse the next N builds of any kind
    RefuseNext { count: usize },

    /// Refuse every build of one kind
    RefuseKind { kind: SequenceKind },
}

/// A fault injected into the request server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFault {
    /// Starting the server fails as if the port were taken
    BindFailure,

    /// The next N polls fail with a transport error
    PollFailure { count: usize },
}

/// A fault injected into a service's process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceFault {
    /// The next N starts of the service exit immediately
    CrashOnStart { service: ServiceId, count: usize },
}

/// A plan describing all faults to inject
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    factory_faults: Vec<FactoryFault>,
    server_faults: Vec<ServerFault>,
    service_faults: Vec<ServiceFault>,
}

impl FaultPlan {
    /// Creates a new empty fault plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a factory fault to the plan
    pub fn with_factory_fault(mut self, fault: FactoryFault) -> Self {
        self.factory_faults.push(fault);
        self
    }

    /// Adds a server fault to the plan
    pub fn with_server_fault(mut self, fault: ServerFault) -> Self {
        self.server_faults.push(fault);
        self
    }

    /// Adds a service fault to the plan
    pub fn with_service_fault(mut self, fault: ServiceFault) -> Self {
        self.service_faults.push(fault);
        self
    }

    pub fn factory_faults(&self) -> &[FactoryFault] {
        &self.factory_faults
    }

    pub fn server_faults(&self) -> &[ServerFault] {
        &self.server_faults
    }

    pub fn service_faults(&self) -> &[ServiceFault] {
        &self.service_faults
    }

    /// Checks if the plan injects nothing
    pub fn is_empty(&self) -> bool {
        self.factory_faults.is_empty()
            && self.server_faults.is_empty()
            && self.service_faults.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_plan_creation() {
        let plan = FaultPlan::new();
        assert!(plan.is_empty());
        assert!(plan.factory_faults().is_empty());
        assert!(plan.server_faults().is_empty());
        assert!(plan.service_faults().is_empty());
    }

    #[test]
    fn test_fault_plan_builders() {
        let service = ServiceId::new();
        let plan = FaultPlan::new()
            .with_factory_fault(FactoryFault::RefuseKind {
                kind: SequenceKind::Stop,
            })
            .with_server_fault(ServerFault::PollFailure { count: 2 })
            .with_service_fault(ServiceFault::CrashOnStart { service, count: 1 });

        assert!(!plan.is_empty());
        assert_eq!(
            plan.service_faults(),
            &[ServiceFault::CrashOnStart { service, count: 1 }]
        );
        assert_eq!(plan.server_faults(), &[ServerFault::PollFailure { count: 2 }]);
    }
}
