//! The `TimeCoordinator` contract `FederateState` relies on. The algorithm
//! itself — how a coordinator decides when to grant a time, how it
//! negotiates with peers — is out of scope (spec §1); this module defines
//! only the boundary.

use std::sync::Arc;

use crate::action::ActionMessage;
use crate::config::FederateConfig;
use crate::handle::FederateId;
use crate::time::Time;

/// Internal convergence token. `Continue` means "keep draining the queue";
/// it is never handed across a public `FederateState` entry point — see
/// [`Convergence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceState {
    Continue,
    Nonconverged,
    Complete,
    Halted,
    Error,
}

/// The user-visible outcome of a lifecycle call (spec §3, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    Nonconverged,
    Complete,
    Halted,
    Error,
}

impl From<ConvergenceState> for Convergence {
    fn from(value: ConvergenceState) -> Self {
        match value {
            ConvergenceState::Nonconverged => Convergence::Nonconverged,
            ConvergenceState::Complete => Convergence::Complete,
            ConvergenceState::Halted => Convergence::Halted,
            ConvergenceState::Error => Convergence::Error,
            ConvergenceState::Continue => {
                unreachable!("ConvergenceState::Continue must never escape the drain loop")
            }
        }
    }
}

/// Abstraction over "push this `ActionMessage` to the broker/core", installed
/// via `FederateState::set_parent` and forwarded to the coordinator (spec
/// §9: "Back-reference to parent core ... abstract as a message-sink
/// capability injected at construction; do not expose the full parent.").
pub trait MessageSink: Send + Sync {
    fn send(&self, message: ActionMessage);
}

impl<F> MessageSink for F
where
    F: Fn(ActionMessage) + Send + Sync,
{
    fn send(&self, message: ActionMessage) {
        (self)(message)
    }
}

/// The contract consumed by `FederateState` (spec §6). Implementations
/// negotiate grant times with peer federates; this crate treats that
/// negotiation as a black box.
pub trait TimeCoordinator: Send + Sync {
    fn set_info(&mut self, info: FederateConfig);
    fn fed_info(&self) -> FederateConfig;

    fn source_id(&self) -> FederateId;
    fn set_source_id(&mut self, id: FederateId);

    fn entering_exec_mode(&mut self, converged: ConvergenceState);

    fn time_request(
        &mut self,
        next_time: Time,
        converged: ConvergenceState,
        next_value_time: Time,
        next_message_time: Time,
    );

    /// Returns whether `cmd` was actionable (consumed/relevant); `false`
    /// tells the caller to stop processing this command (spec §4.5).
    fn process_time_message(&mut self, cmd: &ActionMessage) -> bool;

    fn check_exec_entry(&mut self) -> ConvergenceState;
    fn check_time_grant(&mut self) -> ConvergenceState;

    fn granted_time(&self) -> Time;
    fn current_iteration(&self) -> u32;

    fn add_dependency(&mut self, federate: FederateId);
    fn add_dependent(&mut self, federate: FederateId);
    fn remove_dependency(&mut self, federate: FederateId);
    fn remove_dependent(&mut self, federate: FederateId);
    fn dependents(&self) -> Vec<FederateId>;

    fn update_message_time(&mut self, time: Time);
    fn update_value_time(&mut self, time: Time);

    fn set_message_sender(&mut self, sink: Arc<dyn MessageSink>);

    /// Escape hatch for tests that need to drive a concrete coordinator
    /// (e.g. [`loopback::LoopbackCoordinator`]) through a `Box<dyn
    /// TimeCoordinator>`.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

/// A trivial in-memory `TimeCoordinator` used by this crate's own tests and
/// available to downstream integration tests. Grants are driven entirely by
/// whatever the test pushes through `process_time_message`/`check_*`; there
/// is no real peer negotiation.
#[cfg(feature = "test-support")]
pub mod loopback {
    use super::*;
    use std::collections::BTreeSet;

    pub struct LoopbackCoordinator {
        info: FederateConfig,
        source_id: FederateId,
        granted_time: Time,
        iteration: u32,
        dependencies: BTreeSet<FederateId>,
        dependents: BTreeSet<FederateId>,
        sender: Option<Arc<dyn MessageSink>>,
        /// Forced outcome for the next `check_exec_entry`/`check_time_grant`
        /// call; tests drive the coordinator by setting this directly.
        pub next_outcome: ConvergenceState,
        pub next_grant: Time,
        /// Forced return value for the next `process_time_message` call.
        pub next_actionable: bool,
        pub last_message_time: Option<Time>,
        pub last_value_time: Option<Time>,
    }

    impl Default for LoopbackCoordinator {
        fn default() -> Self {
            LoopbackCoordinator {
                info: FederateConfig::default(),
                source_id: FederateId::default(),
                granted_time: Time::ZERO,
                iteration: 0,
                dependencies: BTreeSet::new(),
                dependents: BTreeSet::new(),
                sender: None,
                next_outcome: ConvergenceState::Complete,
                next_grant: Time::ZERO,
                next_actionable: true,
                last_message_time: None,
                last_value_time: None,
            }
        }
    }

    impl LoopbackCoordinator {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl TimeCoordinator for LoopbackCoordinator {
        fn set_info(&mut self, info: FederateConfig) {
            self.info = info;
        }

        fn fed_info(&self) -> FederateConfig {
            self.info.clone()
        }

        fn source_id(&self) -> FederateId {
            self.source_id
        }

        fn set_source_id(&mut self, id: FederateId) {
            self.source_id = id;
        }

        fn entering_exec_mode(&mut self, _converged: ConvergenceState) {}

        fn time_request(
            &mut self,
            _next_time: Time,
            _converged: ConvergenceState,
            _next_value_time: Time,
            _next_message_time: Time,
        ) {
        }

        fn process_time_message(&mut self, _cmd: &ActionMessage) -> bool {
            self.next_actionable
        }

        fn check_exec_entry(&mut self) -> ConvergenceState {
            self.next_outcome
        }

        fn check_time_grant(&mut self) -> ConvergenceState {
            if self.next_outcome != ConvergenceState::Continue {
                self.granted_time = self.next_grant;
            }
            self.next_outcome
        }

        fn granted_time(&self) -> Time {
            self.granted_time
        }

        fn current_iteration(&self) -> u32 {
            self.iteration
        }

        fn add_dependency(&mut self, federate: FederateId) {
            self.dependencies.insert(federate);
        }

        fn add_dependent(&mut self, federate: FederateId) {
            self.dependents.insert(federate);
        }

        fn remove_dependency(&mut self, federate: FederateId) {
            self.dependencies.remove(&federate);
        }

        fn remove_dependent(&mut self, federate: FederateId) {
            self.dependents.remove(&federate);
        }

        fn dependents(&self) -> Vec<FederateId> {
            self.dependents.iter().copied().collect()
        }

        fn update_message_time(&mut self, time: Time) {
            self.last_message_time = Some(time);
        }

        fn update_value_time(&mut self, time: Time) {
            self.last_value_time = Some(time);
        }

        fn set_message_sender(&mut self, sink: Arc<dyn MessageSink>) {
            self.sender = Some(sink);
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }
}
