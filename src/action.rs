//! `ActionMessage`s exchanged between a federate and the broker/core, and the
//! inbound `ActionQueue` that delivers them to the single-worker drainer.

use std::sync::Arc;

use crate::handle::{FederateId, Handle};
use crate::time::Time;

/// Tagged command code. Names follow the `CMD_*` convention of spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ignore,

    // control
    InitGrant,
    ExecRequest,
    ExecGrant,
    ExecCheck,
    Stop,
    Disconnect,
    TimeRequest,
    TimeGrant,
    TimeCheck,
    Error,
    FedAck { error: bool },

    // registration / notification
    RegPub,
    NotifyPub,
    RegSub,
    NotifySub,
    RegEnd,
    NotifyEnd,
    AddDependency,
    AddDependent,
    RemoveDependency,
    RemoveDependent,
    RegDstFilter,
    NotifyDstFilter,
    RegSrcFilter,
    NotifySrcFilter,

    // data
    SendMessage,
    SendForFilter,
    Pub,
}

/// A command exchanged between a federate and the broker/core.
#[derive(Debug, Clone)]
pub struct ActionMessage {
    pub action: Command,
    pub source_id: FederateId,
    pub source_handle: Handle,
    pub dest_id: FederateId,
    pub dest_handle: Handle,
    pub action_time: Time,
    pub payload: Option<Arc<[u8]>>,
    pub name: Option<String>,
    pub source_type: Option<String>,
    pub source_units: Option<String>,
}

impl ActionMessage {
    /// Build the minimal message needed for most control commands.
    pub fn new(action: Command) -> Self {
        ActionMessage {
            action,
            source_id: FederateId::default(),
            source_handle: Handle::default(),
            dest_id: FederateId::default(),
            dest_handle: Handle::default(),
            action_time: Time::ZERO,
            payload: None,
            name: None,
            source_type: None,
            source_units: None,
        }
    }

    pub fn with_dest(mut self, dest_id: FederateId, dest_handle: Handle) -> Self {
        self.dest_id = dest_id;
        self.dest_handle = dest_handle;
        self
    }

    pub fn with_source(mut self, source_id: FederateId, source_handle: Handle) -> Self {
        self.source_id = source_id;
        self.source_handle = source_handle;
        self
    }

    pub fn with_time(mut self, time: Time) -> Self {
        self.action_time = time;
        self
    }

    pub fn with_payload(mut self, payload: Arc<[u8]>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches the declared type/units of the interface on the sending end
    /// of a registration command, checked against the bound interface's own
    /// declaration at dispatch time (spec §6/§7b).
    pub fn with_type_units(mut self, source_type: impl Into<String>, source_units: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self.source_units = Some(source_units.into());
        self
    }
}

/// Thread-safe FIFO of `ActionMessage`s. Cloning a [`ActionQueueSender`] gives
/// each producer its own handle, matching the "one or more producer threads"
/// model of spec §5; there is exactly one [`ActionQueue`] receiver per
/// federate.
pub struct ActionQueue {
    sender: crossbeam_channel::Sender<ActionMessage>,
    receiver: crossbeam_channel::Receiver<ActionMessage>,
}

#[derive(Clone)]
pub struct ActionQueueSender(crossbeam_channel::Sender<ActionMessage>);

impl ActionQueueSender {
    /// Validates `action != CMD_IGNORE` and enqueues, mirroring
    /// `FederateState::addAction` (spec §6). Returns `false` if the receiver
    /// has been dropped (the federate has gone away).
    pub fn add_action(&self, action: ActionMessage) -> bool {
        if matches!(action.action, Command::Ignore) {
            return true;
        }
        self.0.send(action).is_ok()
    }
}

impl Default for ActionQueue {
    fn default() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        ActionQueue { sender, receiver }
    }
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(&self) -> ActionQueueSender {
        ActionQueueSender(self.sender.clone())
    }

    /// Push directly from the owning federate (e.g. the local `TIME_CHECK`
    /// primer in `requestTime`, spec §4.4).
    pub fn push_local(&self, action: ActionMessage) {
        let _ = self.sender.send(action);
    }

    /// Blocking pop; this is the suspension point referenced in spec §5.
    /// Returns `None` only if every sender (including this queue's own) has
    /// been dropped, which cannot happen while `self` is alive unless the
    /// caller has also dropped its `ActionQueueSender`s.
    pub fn pop(&self) -> Option<ActionMessage> {
        self.receiver.recv().ok()
    }

    pub fn try_pop(&self) -> Option<ActionMessage> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_is_dropped() {
        let queue = ActionQueue::new();
        let sender = queue.sender();
        assert!(sender.add_action(ActionMessage::new(Command::Ignore)));
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn fifo_order_preserved() {
        let queue = ActionQueue::new();
        let sender = queue.sender();
        sender.add_action(ActionMessage::new(Command::TimeCheck).with_time(Time::from(1)));
        sender.add_action(ActionMessage::new(Command::TimeCheck).with_time(Time::from(2)));
        assert_eq!(queue.pop().unwrap().action_time, Time::from(1));
        assert_eq!(queue.pop().unwrap().action_time, Time::from(2));
    }
}
