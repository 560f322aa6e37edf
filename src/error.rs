//! Synchronously-surfaced error cases (spec §7a/§7b). Out-of-range lookups,
//! malformed time deltas, and messages for unknown handles are *not* errors —
//! see `registry.rs`/`input.rs` for the silent-`None`/normalize/drop paths.

use crate::handle::Handle;

#[derive(Debug, thiserror::Error)]
pub enum FederateError {
    #[error("duplicate name {name:?} registered for a {kind}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("type mismatch wiring {key:?}: declared {declared:?}, incoming {incoming:?}")]
    TypeMismatch {
        key: String,
        declared: String,
        incoming: String,
    },

    #[error("unit mismatch wiring {key:?}: declared {declared:?}, incoming {incoming:?}")]
    UnitMismatch {
        key: String,
        declared: String,
        incoming: String,
    },

    #[error("handle {0:?} does not refer to a registered interface")]
    UnknownHandle(Handle),
}
