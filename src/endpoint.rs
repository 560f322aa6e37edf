//! `EndpointInfo`: a message-passing interface with a time-ordered inbound
//! queue (spec §4.2's endpoint side). Symmetric with [`crate::filter::FilterInfo`].

use std::sync::Arc;

use crate::handle::{GlobalHandle, Handle};
use crate::registry::Named;
use crate::time::Time;

#[derive(Debug, Clone)]
pub struct Message {
    pub source: GlobalHandle,
    pub dest: GlobalHandle,
    pub time: Time,
    pub data: Arc<[u8]>,
}

pub struct EndpointInfo {
    handle: Handle,
    name: String,
    endpoint_type: String,
    /// Sorted by `time` ascending; ties broken FIFO (insertion order within
    /// equal times), mirroring the original's stable queue semantics.
    queue: Vec<Message>,
    has_source_filter: bool,
}

impl Named for EndpointInfo {
    fn handle(&self) -> Handle {
        self.handle
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl EndpointInfo {
    pub fn new(handle: Handle, name: impl Into<String>, endpoint_type: impl Into<String>) -> Self {
        EndpointInfo {
            handle,
            name: name.into(),
            endpoint_type: endpoint_type.into(),
            queue: Vec::new(),
            has_source_filter: false,
        }
    }

    pub fn endpoint_type(&self) -> &str {
        &self.endpoint_type
    }

    pub fn mark_has_source_filter(&mut self) {
        self.has_source_filter = true;
    }

    pub fn has_source_filter(&self) -> bool {
        self.has_source_filter
    }

    /// Insert a message, keeping the queue sorted by `time` (stable: a
    /// message never jumps ahead of an equal-time message already queued).
    pub fn add_message(&mut self, message: Message) {
        let pos = self.queue.partition_point(|m| m.time <= message.time);
        self.queue.insert(pos, message);
    }

    /// Time of the earliest still-queued message, or `Time::MAX_VAL` if empty
    /// (spec §4.5, used by `FederateState::nextMessageTime`).
    pub fn first_message_time(&self) -> Time {
        self.queue.first().map(|m| m.time).unwrap_or(Time::MAX_VAL)
    }

    pub fn queue_size(&self, grant_time: Time) -> usize {
        self.queue.iter().take_while(|m| m.time <= grant_time).count()
    }

    /// Pop the earliest message with `time <= grant_time`, if any.
    pub fn get_message(&mut self, grant_time: Time) -> Option<Message> {
        if self.queue.first().is_some_and(|m| m.time <= grant_time) {
            Some(self.queue.remove(0))
        } else {
            None
        }
    }

    pub fn has_message(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::FederateId;

    fn gh(id: u64) -> GlobalHandle {
        GlobalHandle::new(FederateId::new(id), Handle::new(0))
    }

    fn msg(time: i64, byte: u8) -> Message {
        Message {
            source: gh(1),
            dest: gh(2),
            time: Time::from(time),
            data: Arc::from(vec![byte]),
        }
    }

    #[test]
    fn messages_are_ordered_by_time_and_stable_within_ties() {
        let mut ep = EndpointInfo::new(Handle::new(0), "ep", "raw");
        ep.add_message(msg(5, 1));
        ep.add_message(msg(2, 2));
        ep.add_message(msg(2, 3));

        assert_eq!(ep.get_message(Time::from(2)).unwrap().data[0], 2);
        assert_eq!(ep.get_message(Time::from(2)).unwrap().data[0], 3);
        assert!(ep.get_message(Time::from(2)).is_none());
        assert_eq!(ep.get_message(Time::from(5)).unwrap().data[0], 1);
    }

    #[test]
    fn first_message_time_is_max_val_when_empty() {
        let ep = EndpointInfo::new(Handle::new(0), "ep", "raw");
        assert_eq!(ep.first_message_time(), Time::MAX_VAL);
    }
}
