//! Local and federation-wide identifiers for registered interfaces.

use std::fmt;

use tinymap::Key;

/// Federate-local identifier for a registered publication, subscription,
/// endpoint, or filter. Ordering is meaningful: [`HandleRegistry`](crate::registry::HandleRegistry)
/// keeps a handle-sorted vector per kind for binary-search lookup.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Handle(u64);

impl Handle {
    /// Sentinel returned by `receive_any`/`receive_any_filter` when no
    /// message qualifies.
    pub const INVALID: Handle = Handle(u64::MAX);

    pub const fn new(id: u64) -> Self {
        Handle(id)
    }
}

impl Key for Handle {
    fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for Handle {
    fn from(value: usize) -> Self {
        Handle(value as u64)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Handle::INVALID {
            write!(f, "Handle(invalid)")
        } else {
            write!(f, "Handle({})", self.0)
        }
    }
}

/// Opaque identifier for a federate within the federation, assigned by the
/// broker/core via `CMD_FED_ACK` (see [`crate::federate::FederateState`]).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FederateId(u64);

impl FederateId {
    /// `dest_id == 0` in an `ActionMessage` means "broadcast to every federate".
    pub const BROADCAST: FederateId = FederateId(0);

    pub const fn new(id: u64) -> Self {
        FederateId(id)
    }
}

/// `(federate_id, handle)` pair uniquely identifying an item across the
/// federation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobalHandle {
    pub federate_id: FederateId,
    pub handle: Handle,
}

impl GlobalHandle {
    pub const fn new(federate_id: FederateId, handle: Handle) -> Self {
        GlobalHandle {
            federate_id,
            handle,
        }
    }
}
