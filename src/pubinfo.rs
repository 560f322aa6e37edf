//! `PublicationInfo`: a registered output interface and the subscribers wired
//! to it (spec §4.2's publication side).

use std::sync::Arc;

use crate::handle::{GlobalHandle, Handle};
use crate::registry::Named;
use crate::time::Time;

pub struct PublicationInfo {
    handle: Handle,
    name: String,
    pub_type: String,
    pub_units: String,
    subscribers: Vec<GlobalHandle>,
    last_value: Option<Arc<[u8]>>,
    last_publish_time: Time,
    /// Minimum gap enforced between successive publish times; `None` means
    /// every publish is accepted regardless of timing.
    pub minimum_time_gap: Option<Time>,
}

impl Named for PublicationInfo {
    fn handle(&self) -> Handle {
        self.handle
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl PublicationInfo {
    pub fn new(
        handle: Handle,
        name: impl Into<String>,
        pub_type: impl Into<String>,
        pub_units: impl Into<String>,
    ) -> Self {
        PublicationInfo {
            handle,
            name: name.into(),
            pub_type: pub_type.into(),
            pub_units: pub_units.into(),
            subscribers: Vec::new(),
            last_value: None,
            last_publish_time: Time::MIN_VAL,
            minimum_time_gap: None,
        }
    }

    pub fn pub_type(&self) -> &str {
        &self.pub_type
    }

    pub fn pub_units(&self) -> &str {
        &self.pub_units
    }

    pub fn add_subscriber(&mut self, subscriber: GlobalHandle) {
        if !self.subscribers.contains(&subscriber) {
            self.subscribers.push(subscriber);
        }
    }

    pub fn remove_subscriber(&mut self, subscriber: GlobalHandle) {
        self.subscribers.retain(|s| *s != subscriber);
    }

    pub fn subscribers(&self) -> &[GlobalHandle] {
        &self.subscribers
    }

    /// Records a publish and returns whether it satisfied the configured
    /// minimum time gap; the caller decides whether a violating publish is
    /// still forwarded (spec §7e: silently dropped/normalized, never a hard
    /// error at this layer).
    pub fn publish(&mut self, time: Time, payload: Arc<[u8]>) -> bool {
        let within_gap = match self.minimum_time_gap {
            Some(gap) if self.last_value.is_some() => time - self.last_publish_time >= gap,
            _ => true,
        };
        self.last_publish_time = time;
        self.last_value = Some(payload);
        within_gap
    }

    pub fn last_value(&self) -> Option<&Arc<[u8]>> {
        self.last_value.as_ref()
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
    fn subscribers_are_deduplicated() {
        let mut info = PublicationInfo::new(Handle::new(0), "pub", "double", "m");
        info.add_subscriber(gh(1));
        info.add_subscriber(gh(1));
        assert_eq!(info.subscribers().len(), 1);
    }

    #[test]
    fn publish_retains_last_value_regardless_of_gap() {
        let mut info = PublicationInfo::new(Handle::new(0), "pub", "double", "m");
        info.minimum_time_gap = Some(Time::from(10));
        assert!(info.publish(Time::from(0), Arc::from(vec![1])));
        assert!(!info.publish(Time::from(5), Arc::from(vec![2])));
        assert_eq!(**info.last_value().unwrap(), [2]);
    }
}
