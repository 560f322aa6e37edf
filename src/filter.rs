//! `FilterInfo`: a source or destination message filter registered against
//! one or more endpoints (spec §4.2's filter side). Symmetric with
//! [`crate::endpoint::EndpointInfo`]: messages routed to a filter for
//! inspection (`CMD_SEND_FOR_FILTER`, spec §4.5) sit in the same kind of
//! time-ordered queue an endpoint holds for its own inbound messages.

use crate::endpoint::Message;
use crate::handle::{GlobalHandle, Handle};
use crate::registry::Named;
use crate::time::Time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Source,
    Destination,
}

pub struct FilterInfo {
    handle: Handle,
    name: String,
    kind: FilterKind,
    filter_type: String,
    /// Endpoints this filter is attached to; a source filter may be attached
    /// to several source endpoints, a destination filter to exactly one
    /// destination by convention but this does not enforce that.
    targets: Vec<GlobalHandle>,
    /// Messages routed here for filtering, sorted by `time` (spec §4.5's
    /// `CMD_SEND_FOR_FILTER`, no `impactWindow` added unlike `CMD_SEND_MESSAGE`).
    queue: Vec<Message>,
}

impl Named for FilterInfo {
    fn handle(&self) -> Handle {
        self.handle
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl FilterInfo {
    pub fn new(
        handle: Handle,
        name: impl Into<String>,
        kind: FilterKind,
        filter_type: impl Into<String>,
    ) -> Self {
        FilterInfo {
            handle,
            name: name.into(),
            kind,
            filter_type: filter_type.into(),
            targets: Vec::new(),
            queue: Vec::new(),
        }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn filter_type(&self) -> &str {
        &self.filter_type
    }

    pub fn add_target(&mut self, endpoint: GlobalHandle) {
        if !self.targets.contains(&endpoint) {
            self.targets.push(endpoint);
        }
    }

    pub fn remove_target(&mut self, endpoint: GlobalHandle) {
        self.targets.retain(|t| *t != endpoint);
    }

    pub fn targets(&self) -> &[GlobalHandle] {
        &self.targets
    }

    /// Insert a message for filtering, keeping the queue sorted by `time`
    /// (symmetric with `EndpointInfo::add_message`).
    pub fn add_message(&mut self, message: Message) {
        let pos = self.queue.partition_point(|m| m.time <= message.time);
        self.queue.insert(pos, message);
    }

    pub fn first_message_time(&self) -> Time {
        self.queue.first().map(|m| m.time).unwrap_or(Time::MAX_VAL)
    }

    pub fn queue_size(&self, grant_time: Time) -> usize {
        self.queue.iter().take_while(|m| m.time <= grant_time).count()
    }

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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::FederateId;

    fn gh(id: u64) -> GlobalHandle {
        GlobalHandle::new(FederateId::new(id), Handle::new(0))
    }

    #[test]
    fn targets_are_deduplicated() {
        let mut filter = FilterInfo::new(Handle::new(0), "f", FilterKind::Source, "raw");
        filter.add_target(gh(1));
        filter.add_target(gh(1));
        assert_eq!(filter.targets().len(), 1);
    }

    #[test]
    fn queued_messages_are_released_at_their_time() {
        let mut filter = FilterInfo::new(Handle::new(0), "f", FilterKind::Source, "raw");
        filter.add_message(Message {
            source: gh(1),
            dest: gh(2),
            time: Time::from(5),
            data: std::sync::Arc::from(vec![1]),
        });
        assert!(filter.get_message(Time::from(4)).is_none());
        assert_eq!(filter.get_message(Time::from(5)).unwrap().data[0], 1);
    }
}
