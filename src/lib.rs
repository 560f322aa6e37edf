//! Per-federate runtime core for a distributed co-simulation framework.
//!
//! [`federate::FederateState`] is the lifecycle state machine,
//! single-consumer command processor, interface registry, time-coordination
//! client, and delivery surface for one federate. The broker/core, the
//! [`coordinator::TimeCoordinator`] algorithm, wire serialization, and filter
//! execution semantics are external collaborators consumed only through the
//! contracts in [`coordinator`] and [`action`].

pub mod action;
pub mod config;
pub mod coordinator;
pub mod endpoint;
pub mod error;
pub mod federate;
pub mod filter;
pub mod handle;
pub mod input;
pub mod lifecycle;
pub mod logging;
pub mod pubinfo;
pub mod registry;
pub mod time;
pub mod types;

pub use action::{ActionMessage, ActionQueue, ActionQueueSender, Command};
pub use config::FederateConfig;
pub use coordinator::{Convergence, ConvergenceState, MessageSink, TimeCoordinator};
pub use endpoint::{EndpointInfo, Message};
pub use error::FederateError;
pub use federate::{FederateState, TimeRequestResult};
pub use filter::{FilterInfo, FilterKind};
pub use handle::{FederateId, GlobalHandle, Handle};
pub use input::InputInfo;
pub use lifecycle::LifecycleState;
pub use pubinfo::PublicationInfo;
pub use registry::HandleRegistry;
pub use time::Time;
