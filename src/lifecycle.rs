//! `FederateLifecycle`: the atomic state machine a federate moves through
//! from registration to termination (spec §3, §4.3).

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Created = 0,
    Initializing = 1,
    Executing = 2,
    Finished = 3,
    Error = 4,
    None = 5,
}

impl LifecycleState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => LifecycleState::Created,
            1 => LifecycleState::Initializing,
            2 => LifecycleState::Executing,
            3 => LifecycleState::Finished,
            4 => LifecycleState::Error,
            _ => LifecycleState::None,
        }
    }
}

/// Atomic holder for a federate's [`LifecycleState`]. Transitions follow
/// `CREATED -> INITIALIZING -> EXECUTING`, with `-> FINISHED`/`-> ERROR`
/// reachable from any non-terminal state; anything else is a silent no-op
/// (spec §3). `reset`/`reInit` bypass the compare-exchange entirely — they
/// are administrative overrides, not protocol transitions.
pub struct FederateLifecycle(AtomicU8);

impl Default for FederateLifecycle {
    fn default() -> Self {
        FederateLifecycle(AtomicU8::new(LifecycleState::Created as u8))
    }
}

impl FederateLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// `setState(newState)` from spec §4.3: returns whether the transition
    /// took effect.
    pub fn set_state(&self, new: LifecycleState) -> bool {
        match new {
            LifecycleState::Error | LifecycleState::Finished | LifecycleState::Created => {
                self.0.store(new as u8, Ordering::Release);
                true
            }
            LifecycleState::Initializing => self
                .0
                .compare_exchange(
                    LifecycleState::Created as u8,
                    new as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok(),
            LifecycleState::Executing => self
                .0
                .compare_exchange(
                    LifecycleState::Initializing as u8,
                    new as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok(),
            LifecycleState::None => false,
        }
    }

    /// Administrative override to `CREATED`, skipping the compare-exchange.
    pub fn reset(&self) {
        self.0.store(LifecycleState::Created as u8, Ordering::Release);
    }

    /// Administrative override to `INITIALIZING`, skipping the compare-exchange.
    pub fn reinit(&self) {
        self.0
            .store(LifecycleState::Initializing as u8, Ordering::Release);
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.get(), LifecycleState::Finished | LifecycleState::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_transitions_advance_in_order() {
        let lc = FederateLifecycle::new();
        assert!(lc.set_state(LifecycleState::Initializing));
        assert!(lc.set_state(LifecycleState::Executing));
        assert_eq!(lc.get(), LifecycleState::Executing);
    }

    #[test]
    fn non_adjacent_transition_is_a_no_op() {
        let lc = FederateLifecycle::new();
        assert!(!lc.set_state(LifecycleState::Executing));
        assert_eq!(lc.get(), LifecycleState::Created);
    }

    #[test]
    fn error_reachable_from_any_state() {
        let lc = FederateLifecycle::new();
        lc.set_state(LifecycleState::Initializing);
        assert!(lc.set_state(LifecycleState::Error));
        assert_eq!(lc.get(), LifecycleState::Error);
    }

    #[test]
    fn reset_bypasses_compare_exchange() {
        let lc = FederateLifecycle::new();
        lc.set_state(LifecycleState::Initializing);
        lc.set_state(LifecycleState::Executing);
        lc.reset();
        assert_eq!(lc.get(), LifecycleState::Created);
    }
}
