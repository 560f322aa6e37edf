//! `InputInfo`: a per-subscription, multi-source, time-ordered value buffer
//! with merge policy (spec §4.2). Grounded directly in HELICS's
//! `InputInfo.cpp`/`InputInfo.hpp`.

use std::sync::Arc;

use crate::handle::{GlobalHandle, Handle};
use crate::registry::Named;
use crate::time::Time;
use crate::types::merge_type;

/// A single queued, not-yet-revealed value update.
#[derive(Debug, Clone)]
pub struct DataRecord {
    pub time: Time,
    pub iteration: u32,
    pub payload: Arc<[u8]>,
}

impl DataRecord {
    fn sort_key(&self) -> (Time, u32) {
        (self.time, self.iteration)
    }
}

/// One upstream source feeding this input.
struct SourceSlot {
    source: GlobalHandle,
    #[allow(dead_code)]
    name: String,
    #[allow(dead_code)]
    decl_type: String,
    #[allow(dead_code)]
    decl_units: String,
    priority: i32,
    /// No record with `time > deactivated` is ever inserted; lowered by
    /// `remove_source`.
    deactivated: Time,
    /// Sorted by `(time, iteration)` ascending.
    queue: Vec<DataRecord>,
    current_data: Option<Arc<[u8]>>,
    current_data_time: (Time, u32),
}

impl SourceSlot {
    fn new(source: GlobalHandle, name: String, decl_type: String, decl_units: String) -> Self {
        SourceSlot {
            source,
            name,
            decl_type,
            decl_units,
            priority: 0,
            deactivated: Time::MAX_VAL,
            queue: Vec::new(),
            current_data: None,
            current_data_time: (Time::MIN_VAL, 0),
        }
    }

    /// Writes `record` into `current_data` unless `only_update_on_change` is
    /// set and the payload bytes are unchanged; returns whether a semantic
    /// update occurred (spec §4.2, testable property 5).
    fn update_data(&mut self, record: DataRecord, only_update_on_change: bool) -> bool {
        let unchanged = only_update_on_change
            && self
                .current_data
                .as_ref()
                .is_some_and(|cur| **cur == *record.payload);

        if !unchanged {
            self.current_data_time = (record.time, record.iteration);
            self.current_data = Some(record.payload);
            return true;
        }
        if self.current_data_time.0 == record.time {
            // bookkeeping only: still advance the recorded iteration.
            self.current_data_time.1 = record.iteration;
        }
        false
    }
}

pub struct InputInfo {
    handle: Handle,
    name: String,
    pub required: bool,
    /// Type/units the subscribing application declared at creation time,
    /// distinct from `input_type`/`input_units` below (the latter is merged
    /// from whatever sources actually get wired).
    requested_type: String,
    requested_units: String,
    input_type: String,
    input_units: String,
    sources: Vec<SourceSlot>,
    /// If set, `next_value_time` always reports `Time::MAX_VAL`, so pending
    /// updates never force a smaller grant time.
    pub not_interruptible: bool,
    pub only_update_on_change: bool,
}

impl Named for InputInfo {
    fn handle(&self) -> Handle {
        self.handle
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl InputInfo {
    pub fn new(handle: Handle, name: impl Into<String>, required: bool) -> Self {
        InputInfo {
            handle,
            name: name.into(),
            required,
            requested_type: String::new(),
            requested_units: String::new(),
            input_type: String::new(),
            input_units: String::new(),
            sources: Vec::new(),
            not_interruptible: false,
            only_update_on_change: false,
        }
    }

    pub fn with_declared(mut self, requested_type: impl Into<String>, requested_units: impl Into<String>) -> Self {
        self.requested_type = requested_type.into();
        self.requested_units = requested_units.into();
        self
    }

    pub fn requested_type(&self) -> &str {
        &self.requested_type
    }

    pub fn requested_units(&self) -> &str {
        &self.requested_units
    }

    pub fn input_type(&self) -> &str {
        &self.input_type
    }

    pub fn input_units(&self) -> &str {
        &self.input_units
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Append a new source slot. The first source establishes
    /// `input_type`/`input_units`; later disagreement degrades both to
    /// `"multi"`. Duplicate sources are allowed and remain as separate slots
    /// (spec §9 Open Question — preserved rather than deduplicated).
    pub fn add_source(
        &mut self,
        source: GlobalHandle,
        name: impl Into<String>,
        decl_type: impl Into<String>,
        decl_units: impl Into<String>,
    ) {
        let decl_type = decl_type.into();
        let decl_units = decl_units.into();

        self.input_type = merge_type(
            if self.sources.is_empty() {
                None
            } else {
                Some(self.input_type.as_str())
            },
            &decl_type,
        );
        self.input_units = merge_type(
            if self.sources.is_empty() {
                None
            } else {
                Some(self.input_units.as_str())
            },
            &decl_units,
        );

        self.sources
            .push(SourceSlot::new(source, name.into(), decl_type, decl_units));
    }

    /// Set the per-source priority used to break ties in
    /// [`InputInfo::get_data_priority`].
    pub fn set_priority(&mut self, source: GlobalHandle, priority: i32) {
        for slot in self.sources.iter_mut().filter(|s| s.source == source) {
            slot.priority = priority;
        }
    }

    fn first_index_of(&self, source: GlobalHandle) -> Option<usize> {
        self.sources.iter().position(|s| s.source == source)
    }

    /// Insert a new value update into the first slot matching `source`;
    /// dropped silently if `value_time` is past that slot's deactivation
    /// cutoff, or if no slot matches (spec §4.2, §7c/e).
    ///
    /// Mirrors `InputInfo::addData`: with duplicate sources only the first
    /// matching slot receives the update (the Open Question in spec §9 is
    /// about `remove_source`, which affects every matching slot; `add_data`
    /// does not).
    pub fn add_data(
        &mut self,
        source: GlobalHandle,
        value_time: Time,
        iteration: u32,
        payload: Arc<[u8]>,
    ) {
        let Some(index) = self.first_index_of(source) else {
            return;
        };
        let slot = &mut self.sources[index];
        if value_time > slot.deactivated {
            return;
        }

        let record = DataRecord {
            time: value_time,
            iteration,
            payload,
        };

        match slot.queue.last() {
            Some(back) if record.sort_key() > back.sort_key() => slot.queue.push(record),
            None => slot.queue.push(record),
            _ => {
                let pos = slot
                    .queue
                    .partition_point(|r| r.sort_key() <= record.sort_key());
                slot.queue.insert(pos, record);
            }
        }
    }

    /// Truncate every slot matching `source` to entries with `time <=
    /// min_time`, and lower that slot's deactivation cutoff if not already
    /// lower. All matching slots are truncated (duplicate sources are all
    /// affected — spec §9 Open Question, preserved as observed).
    pub fn remove_source(&mut self, source: GlobalHandle, min_time: Time) {
        for slot in self.sources.iter_mut().filter(|s| s.source == source) {
            truncate_slot(slot, min_time);
        }
    }

    pub fn remove_source_by_name(&mut self, name: &str, min_time: Time) {
        for slot in self.sources.iter_mut().filter(|s| s.name == name) {
            truncate_slot(slot, min_time);
        }
    }

    /// Drop all queued (not yet revealed) records without touching the
    /// currently revealed values. Grounded in `InputInfo::clearFutureData`.
    pub fn clear_future_data(&mut self) {
        for slot in &mut self.sources {
            slot.queue.clear();
        }
    }

    /// Advance past all records with `time < t`, revealing the last such
    /// record; no record with `time == t` is consumed.
    pub fn update_time_up_to(&mut self, t: Time) -> bool {
        let mut updated = false;
        let only_update_on_change = self.only_update_on_change;
        for slot in &mut self.sources {
            let Some(last_idx) = find_last_strictly_before(&slot.queue, t) else {
                continue;
            };
            let record = slot.queue[last_idx].clone();
            slot.queue.drain(0..=last_idx);
            if slot.update_data(record, only_update_on_change) {
                updated = true;
            }
        }
        updated
    }

    /// Like `update_time_up_to`, but also consumes records with `time == t`.
    pub fn update_time_inclusive(&mut self, t: Time) -> bool {
        let mut updated = false;
        let only_update_on_change = self.only_update_on_change;
        for slot in &mut self.sources {
            let Some(last_idx) = find_last_at_or_before(&slot.queue, t) else {
                continue;
            };
            let record = slot.queue[last_idx].clone();
            slot.queue.drain(0..=last_idx);
            if slot.update_data(record, only_update_on_change) {
                updated = true;
            }
        }
        updated
    }

    /// Like `update_time_up_to`, but if a record exists with `time == t` it
    /// additionally consumes the longest run of `time == t` records sharing
    /// the iteration number of the record last consumed below `t`.
    pub fn update_time_next_iteration(&mut self, t: Time) -> bool {
        let mut updated = false;
        let only_update_on_change = self.only_update_on_change;
        for slot in &mut self.sources {
            let Some(mut last_idx) = find_last_strictly_before(&slot.queue, t) else {
                continue;
            };
            let mut cutoff = last_idx + 1;
            if cutoff < slot.queue.len() && slot.queue[cutoff].time == t {
                let iteration = slot.queue[last_idx].iteration;
                while cutoff < slot.queue.len()
                    && slot.queue[cutoff].time == t
                    && slot.queue[cutoff].iteration == iteration
                {
                    last_idx = cutoff;
                    cutoff += 1;
                }
            }
            let record = slot.queue[last_idx].clone();
            slot.queue.drain(0..cutoff);
            if slot.update_data(record, only_update_on_change) {
                updated = true;
            }
        }
        updated
    }

    /// By-slot-index read; out-of-range returns `None`.
    pub fn get_data(&self, index: usize) -> Option<&Arc<[u8]>> {
        self.sources.get(index)?.current_data.as_ref()
    }

    pub fn current_data_time(&self, index: usize) -> Option<(Time, u32)> {
        self.sources.get(index).map(|s| s.current_data_time)
    }

    /// Priority-arbitrated read: the slot with the latest
    /// `current_data_time`, ties broken by highest `priority`. Returns the
    /// winning slot index alongside its data.
    pub fn get_data_priority(&self) -> Option<(usize, &Arc<[u8]>)> {
        let mut best: Option<usize> = None;
        let mut best_time = Time::MIN_VAL;
        for (idx, slot) in self.sources.iter().enumerate() {
            let t = slot.current_data_time.0;
            if t > best_time {
                best_time = t;
                best = Some(idx);
            } else if t == best_time {
                if let Some(b) = best {
                    if slot.priority > self.sources[b].priority {
                        best = Some(idx);
                    }
                }
            }
        }
        let idx = best?;
        Some((idx, self.sources[idx].current_data.as_ref()?))
    }

    /// Snapshot of every slot's currently revealed payload (`InputInfo::getAllData`).
    pub fn get_all_data(&self) -> Vec<Option<Arc<[u8]>>> {
        self.sources.iter().map(|s| s.current_data.clone()).collect()
    }

    /// Minimum over all non-empty slot queue heads; `Time::MAX_VAL` if
    /// `not_interruptible` is set or every queue is empty.
    pub fn next_value_time(&self) -> Time {
        if self.not_interruptible {
            return Time::MAX_VAL;
        }
        self.sources
            .iter()
            .filter_map(|s| s.queue.first().map(|r| r.time))
            .min()
            .unwrap_or(Time::MAX_VAL)
    }
}

fn truncate_slot(slot: &mut SourceSlot, min_time: Time) {
    while slot.queue.last().is_some_and(|r| r.time > min_time) {
        slot.queue.pop();
    }
    if min_time < slot.deactivated {
        slot.deactivated = min_time;
    }
}

/// Index of the last record with `time < t`, scanning forward and stopping
/// before the first record whose time is `>= t` but past the run that is
/// `< t`. Mirrors the original's forward-scan-then-erase-prefix pattern.
fn find_last_strictly_before(queue: &[DataRecord], t: Time) -> Option<usize> {
    if queue.first()?.time >= t {
        return None;
    }
    let mut last = 0;
    let mut i = 1;
    while i < queue.len() && queue[i].time < t {
        last = i;
        i += 1;
    }
    Some(last)
}

fn find_last_at_or_before(queue: &[DataRecord], t: Time) -> Option<usize> {
    if queue.first()?.time > t {
        return None;
    }
    let mut last = 0;
    let mut i = 1;
    while i < queue.len() && queue[i].time <= t {
        last = i;
        i += 1;
    }
    Some(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::FederateId;

    fn gh(id: u64) -> GlobalHandle {
        GlobalHandle::new(FederateId::new(id), Handle::new(0))
    }

    fn payload(byte: u8) -> Arc<[u8]> {
        Arc::from(vec![byte])
    }

    #[test]
    fn add_data_sorts_by_time_then_iteration() {
        let mut input = InputInfo::new(Handle::new(0), "sub", true);
        input.add_source(gh(1), "pub1", "double", "m");
        input.add_data(gh(1), Time::from(5), 0, payload(5));
        input.add_data(gh(1), Time::from(2), 0, payload(2));
        input.add_data(gh(1), Time::from(2), 1, payload(22));

        assert!(input.update_time_up_to(Time::from(3)));
        assert_eq!(*input.get_data(0).unwrap(), payload(22));
    }

    #[test]
    fn data_past_deactivation_is_dropped() {
        let mut input = InputInfo::new(Handle::new(0), "sub", true);
        input.add_source(gh(1), "pub1", "double", "m");
        input.remove_source(gh(1), Time::from(10));
        input.add_data(gh(1), Time::from(20), 0, payload(1));
        assert_eq!(input.next_value_time(), Time::MAX_VAL);
    }

    #[test]
    fn update_time_up_to_excludes_equal_time() {
        let mut input = InputInfo::new(Handle::new(0), "sub", true);
        input.add_source(gh(1), "pub1", "double", "m");
        input.add_data(gh(1), Time::from(5), 0, payload(5));
        assert!(!input.update_time_up_to(Time::from(5)));
        assert!(input.get_data(0).is_none());
        assert!(input.update_time_up_to(Time::from(6)));
        assert_eq!(*input.get_data(0).unwrap(), payload(5));
    }

    #[test]
    fn update_time_inclusive_includes_equal_time() {
        let mut input = InputInfo::new(Handle::new(0), "sub", true);
        input.add_source(gh(1), "pub1", "double", "m");
        input.add_data(gh(1), Time::from(5), 0, payload(5));
        assert!(input.update_time_inclusive(Time::from(5)));
        assert_eq!(*input.get_data(0).unwrap(), payload(5));
    }

    #[test]
    fn update_time_next_iteration_consumes_matching_run() {
        let mut input = InputInfo::new(Handle::new(0), "sub", true);
        input.add_source(gh(1), "pub1", "double", "m");
        input.add_data(gh(1), Time::from(3), 0, payload(1));
        input.add_data(gh(1), Time::from(5), 0, payload(2));
        input.add_data(gh(1), Time::from(5), 1, payload(3));
        input.add_data(gh(1), Time::from(5), 2, payload(4));

        // last consumed below 5 is iteration 0 (the record at t=3); the run
        // of t=5 records sharing iteration 0 is just the first one.
        assert!(input.update_time_next_iteration(Time::from(5)));
        assert_eq!(*input.get_data(0).unwrap(), payload(2));
    }

    #[test]
    fn only_update_on_change_suppresses_duplicate_payload() {
        let mut input = InputInfo::new(Handle::new(0), "sub", true);
        input.only_update_on_change = true;
        input.add_source(gh(1), "pub1", "double", "m");
        input.add_data(gh(1), Time::from(1), 0, payload(9));
        input.add_data(gh(1), Time::from(2), 0, payload(9));

        assert!(input.update_time_up_to(Time::from(2)));
        assert!(!input.update_time_up_to(Time::from(3)));
        assert_eq!(*input.get_data(0).unwrap(), payload(9));
    }

    #[test]
    fn priority_tie_break_picks_highest_priority() {
        let mut input = InputInfo::new(Handle::new(0), "sub", true);
        input.add_source(gh(1), "pub1", "double", "m");
        input.add_source(gh(2), "pub2", "double", "m");
        input.set_priority(gh(1), 1);
        input.set_priority(gh(2), 5);

        input.add_data(gh(1), Time::from(1), 0, payload(1));
        input.add_data(gh(2), Time::from(1), 0, payload(2));
        input.update_time_inclusive(Time::from(1));

        let (idx, data) = input.get_data_priority().unwrap();
        assert_eq!(idx, 1);
        assert_eq!(**data, *payload(2));
    }

    #[test]
    fn not_interruptible_hides_pending_updates_from_next_value_time() {
        let mut input = InputInfo::new(Handle::new(0), "sub", true);
        input.not_interruptible = true;
        input.add_source(gh(1), "pub1", "double", "m");
        input.add_data(gh(1), Time::from(1), 0, payload(1));
        assert_eq!(input.next_value_time(), Time::MAX_VAL);
    }

    #[test]
    fn heterogeneous_sources_merge_to_multi() {
        let mut input = InputInfo::new(Handle::new(0), "sub", true);
        input.add_source(gh(1), "pub1", "double", "m");
        input.add_source(gh(2), "pub2", "int32", "m");
        assert_eq!(input.input_type(), "multi");
    }

    #[test]
    fn duplicate_sources_preserved_as_separate_slots() {
        let mut input = InputInfo::new(Handle::new(0), "sub", true);
        input.add_source(gh(1), "pub1", "double", "m");
        input.add_source(gh(1), "pub1", "double", "m");
        assert_eq!(input.source_count(), 2);

        // remove_source affects every matching slot.
        input.remove_source(gh(1), Time::from(0));
        input.add_data(gh(1), Time::from(1), 0, payload(1));
        assert_eq!(input.next_value_time(), Time::MAX_VAL);
    }
}
