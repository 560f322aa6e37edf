//! `FederateState`: the lifecycle state machine, single-consumer command
//! processor, interface registry, time-coordination client, and delivery
//! surface for one federate (spec §1, §4.3–§4.7).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::action::{ActionMessage, ActionQueue, ActionQueueSender, Command};
use crate::config::FederateConfig;
use crate::coordinator::{Convergence, ConvergenceState, MessageSink, TimeCoordinator};
use crate::endpoint::{EndpointInfo, Message};
use crate::error::FederateError;
use crate::filter::{FilterInfo, FilterKind};
use crate::handle::{FederateId, GlobalHandle, Handle};
use crate::input::InputInfo;
use crate::lifecycle::{FederateLifecycle, LifecycleState};
use crate::logging::{self, LogLevel};
use crate::pubinfo::PublicationInfo;
use crate::registry::{HandleRegistry, Named};
use crate::time::Time;
use crate::types::{check_type_match, check_unit_match};

/// The interlocking non-registry state mutated only while `processing` is
/// held by the active worker (spec §5): granted time, the event list, the
/// delay queue, and the write-once federation identity. Guarded by a
/// `Mutex` so the borrow checker is satisfied; contention is never real
/// because the `processing` token already serializes every writer.
struct WorkerState {
    time_granted: Time,
    events: Vec<Handle>,
    delay_queue: VecDeque<ActionMessage>,
    global_id: Option<FederateId>,
}

impl Default for WorkerState {
    fn default() -> Self {
        WorkerState {
            time_granted: Time::MIN_VAL,
            events: Vec::new(),
            delay_queue: VecDeque::new(),
            global_id: None,
        }
    }
}

/// Registries for the four interface kinds, mutated under `registries`'s
/// mutex during registration and read without it while processing is active
/// (spec §5) — in practice both paths go through the same `Mutex` for
/// memory safety, but only the registration path ever contends for it.
struct Registries {
    subscriptions: HandleRegistry<InputInfo>,
    publications: HandleRegistry<PublicationInfo>,
    endpoints: HandleRegistry<EndpointInfo>,
    filters: HandleRegistry<FilterInfo>,
    next_handle: u64,
}

impl Default for Registries {
    fn default() -> Self {
        Registries {
            subscriptions: HandleRegistry::new("subscription"),
            publications: HandleRegistry::new("publication"),
            endpoints: HandleRegistry::new("endpoint"),
            filters: HandleRegistry::new("filter"),
            next_handle: 0,
        }
    }
}

impl Registries {
    fn allocate_handle(&mut self) -> Handle {
        let h = Handle::new(self.next_handle);
        self.next_handle += 1;
        h
    }
}

pub struct FederateState {
    config: Mutex<FederateConfig>,
    registries: Mutex<Registries>,
    worker: Mutex<WorkerState>,
    processing: AtomicBool,
    state: FederateLifecycle,
    queue: ActionQueue,
    coordinator: Mutex<Box<dyn TimeCoordinator>>,
    parent: Mutex<Option<Arc<dyn MessageSink>>>,
    /// Registration conflicts detected while draining the queue (spec §7b):
    /// set by `process_action_message`, read back by the application right
    /// after the entry point call that triggered the drain returns.
    last_error: Mutex<Option<FederateError>>,
}

/// Outcome of [`FederateState::request_time`] (spec §4.4's `{grantedTime, outcome}`).
pub struct TimeRequestResult {
    pub granted_time: Time,
    pub outcome: Convergence,
    pub iterating: bool,
}

/// Validates a registration-time wiring against non-strict `checkTypeMatch`/
/// `checkUnitMatch` (spec §6), returning the mismatch to report rather than
/// raising it directly — dispatch has no synchronous caller of its own to
/// propagate a `Result` to.
fn check_wiring_match(
    kind: &'static str,
    declared_type: &str,
    declared_units: &str,
    incoming_type: &str,
    incoming_units: &str,
) -> Result<(), FederateError> {
    if !check_type_match(declared_type, incoming_type, false) {
        return Err(FederateError::TypeMismatch {
            key: kind.to_string(),
            declared: declared_type.to_string(),
            incoming: incoming_type.to_string(),
        });
    }
    if !check_unit_match(declared_units, incoming_units, false) {
        return Err(FederateError::UnitMismatch {
            key: kind.to_string(),
            declared: declared_units.to_string(),
            incoming: incoming_units.to_string(),
        });
    }
    Ok(())
}

impl FederateState {
    pub fn new(config: FederateConfig, coordinator: Box<dyn TimeCoordinator>) -> Self {
        let mut coordinator = coordinator;
        coordinator.set_info(config.clone());
        FederateState {
            config: Mutex::new(config),
            registries: Mutex::new(Registries::default()),
            worker: Mutex::new(WorkerState::default()),
            processing: AtomicBool::new(false),
            state: FederateLifecycle::new(),
            queue: ActionQueue::new(),
            coordinator: Mutex::new(coordinator),
            parent: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    pub fn sender(&self) -> ActionQueueSender {
        self.queue.sender()
    }

    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    pub fn global_id(&self) -> Option<FederateId> {
        self.worker.lock().unwrap().global_id
    }

    /// Takes the most recent registration conflict (spec §7b), if any,
    /// detected while wiring a `RegPub`/`NotifyPub`/`RegEnd`/`NotifyEnd`
    /// command. `None` once read; a fresh conflict overwrites a stale one.
    pub fn take_last_error(&self) -> Option<FederateError> {
        self.last_error.lock().unwrap().take()
    }

    pub fn time_granted(&self) -> Time {
        self.worker.lock().unwrap().time_granted
    }

    /// Install the message-sink capability used to push outbound
    /// `ActionMessage`s (spec §9: abstracted, not a full parent back-reference).
    pub fn set_parent(&self, sink: Arc<dyn MessageSink>) {
        let mut coord = self.coordinator.lock().unwrap();
        coord.set_message_sender(sink.clone());
        *self.parent.lock().unwrap() = Some(sink);
    }

    /// Reach into the boxed `TimeCoordinator` for direct manipulation in
    /// tests that drive a concrete coordinator (e.g. the loopback one)
    /// through an otherwise-opaque `FederateState`.
    #[cfg(feature = "test-support")]
    pub fn with_coordinator_any<R>(&self, f: impl FnOnce(&mut dyn std::any::Any) -> R) -> R {
        f(self.coordinator.lock().unwrap().as_any_mut())
    }

    pub fn update_config(&self, new_config: FederateConfig) {
        let normalized = new_config.normalized();
        let mut coord = self.coordinator.lock().unwrap();
        coord.set_info(normalized.clone());
        *self.config.lock().unwrap() = normalized;
    }

    fn log(&self, level: LogLevel, message: &str) {
        let cfg = self.config.lock().unwrap();
        logging::log(&cfg.name, cfg.log_level, level, message);
    }

    // ---- registration -------------------------------------------------

    pub fn create_subscription(
        &self,
        name: &str,
        declared_type: &str,
        declared_units: &str,
        required: bool,
    ) -> Result<Handle, FederateError> {
        let mut reg = self.registries.lock().unwrap();
        let handle = reg.allocate_handle();
        let info = InputInfo::new(handle, name, required).with_declared(declared_type, declared_units);
        reg.subscriptions.insert(info)
    }

    pub fn create_publication(
        &self,
        name: &str,
        pub_type: &str,
        pub_units: &str,
    ) -> Result<Handle, FederateError> {
        let mut reg = self.registries.lock().unwrap();
        let handle = reg.allocate_handle();
        let info = PublicationInfo::new(handle, name, pub_type, pub_units);
        reg.publications.insert(info)
    }

    pub fn create_endpoint(&self, name: &str, endpoint_type: &str) -> Result<Handle, FederateError> {
        let mut reg = self.registries.lock().unwrap();
        let handle = reg.allocate_handle();
        let info = EndpointInfo::new(handle, name, endpoint_type);
        reg.endpoints.insert(info)
    }

    pub fn create_source_filter(&self, name: &str, filter_type: &str) -> Result<Handle, FederateError> {
        let mut reg = self.registries.lock().unwrap();
        let handle = reg.allocate_handle();
        let info = FilterInfo::new(handle, name, FilterKind::Source, filter_type);
        reg.filters.insert(info)
    }

    pub fn create_dest_filter(&self, name: &str, filter_type: &str) -> Result<Handle, FederateError> {
        let mut reg = self.registries.lock().unwrap();
        let handle = reg.allocate_handle();
        let info = FilterInfo::new(handle, name, FilterKind::Destination, filter_type);
        reg.filters.insert(info)
    }

    // ---- lookup ---------------------------------------------------------

    pub fn subscription_handle(&self, name: &str) -> Option<Handle> {
        self.registries.lock().unwrap().subscriptions.by_name(name).map(|i| i.handle())
    }

    pub fn publication_handle(&self, name: &str) -> Option<Handle> {
        self.registries.lock().unwrap().publications.by_name(name).map(|i| i.handle())
    }

    pub fn endpoint_handle(&self, name: &str) -> Option<Handle> {
        self.registries.lock().unwrap().endpoints.by_name(name).map(|i| i.handle())
    }

    pub fn filter_handle(&self, name: &str) -> Option<Handle> {
        self.registries.lock().unwrap().filters.by_name(name).map(|i| i.handle())
    }

    pub fn with_subscription<R>(&self, handle: Handle, f: impl FnOnce(&InputInfo) -> R) -> Option<R> {
        self.registries.lock().unwrap().subscriptions.by_handle(handle).map(f)
    }

    pub fn with_publication<R>(&self, handle: Handle, f: impl FnOnce(&PublicationInfo) -> R) -> Option<R> {
        self.registries.lock().unwrap().publications.by_handle(handle).map(f)
    }

    pub fn with_endpoint<R>(&self, handle: Handle, f: impl FnOnce(&EndpointInfo) -> R) -> Option<R> {
        self.registries.lock().unwrap().endpoints.by_handle(handle).map(f)
    }

    pub fn with_filter<R>(&self, handle: Handle, f: impl FnOnce(&FilterInfo) -> R) -> Option<R> {
        self.registries.lock().unwrap().filters.by_handle(handle).map(f)
    }

    // ---- event collection (spec §4.6) -----------------------------------

    fn fill_event_vector(&self, worker: &mut WorkerState, current_time: Time) {
        worker.events.clear();
        let mut reg = self.registries.lock().unwrap();
        for sub in reg.subscriptions.iter_mut() {
            if sub.update_time_inclusive(current_time) {
                worker.events.push(sub.handle());
            }
        }
    }

    /// Returns an empty sentinel while a worker is actively draining (spec
    /// §4.6) — the list is mid-mutation in that window.
    pub fn get_events(&self) -> Vec<Handle> {
        if self.processing.load(Ordering::Acquire) {
            return Vec::new();
        }
        self.worker.lock().unwrap().events.clone()
    }

    // ---- message delivery (spec §4.7) -----------------------------------

    /// If `handle` is an endpoint, pop its earliest qualifying message;
    /// otherwise try it as a filter handle; else `None` (spec §4.7).
    pub fn receive(&self, handle: Handle) -> Option<Message> {
        let granted = self.time_granted();
        let mut reg = self.registries.lock().unwrap();
        if let Some(ep) = reg.endpoints.by_handle_mut(handle) {
            return ep.get_message(granted);
        }
        reg.filters.by_handle_mut(handle).and_then(|f| f.get_message(granted))
    }

    pub fn receive_any(&self) -> (Handle, Option<Message>) {
        let granted = self.time_granted();
        let mut reg = self.registries.lock().unwrap();
        let earliest = reg
            .endpoints
            .iter()
            .filter(|e| e.has_message())
            .min_by_key(|e| e.first_message_time())
            .map(|e| e.handle());
        let Some(handle) = earliest else {
            return (Handle::INVALID, None);
        };
        let msg = reg.endpoints.by_handle_mut(handle).and_then(|e| e.get_message(granted));
        match msg {
            Some(m) => (handle, Some(m)),
            None => (Handle::INVALID, None),
        }
    }

    /// Symmetric with `receive_any`, scanning filter queues instead of
    /// endpoint queues (spec §4.7's `receiveAnyFilter`).
    pub fn receive_any_filter(&self) -> (Handle, Option<Message>) {
        let granted = self.time_granted();
        let mut reg = self.registries.lock().unwrap();
        let earliest = reg
            .filters
            .iter()
            .filter(|f| f.has_message())
            .min_by_key(|f| f.first_message_time())
            .map(|f| f.handle());
        let Some(handle) = earliest else {
            return (Handle::INVALID, None);
        };
        let msg = reg.filters.by_handle_mut(handle).and_then(|f| f.get_message(granted));
        match msg {
            Some(m) => (handle, Some(m)),
            None => (Handle::INVALID, None),
        }
    }

    pub fn get_queue_size(&self, handle: Handle) -> usize {
        let granted = self.time_granted();
        self.registries
            .lock()
            .unwrap()
            .endpoints
            .by_handle(handle)
            .map(|e| e.queue_size(granted))
            .unwrap_or(0)
    }

    pub fn get_total_queue_size(&self) -> usize {
        let granted = self.time_granted();
        self.registries
            .lock()
            .unwrap()
            .endpoints
            .iter()
            .map(|e| e.queue_size(granted))
            .sum()
    }

    pub fn get_filter_queue_size(&self, handle: Handle) -> usize {
        let granted = self.time_granted();
        self.registries
            .lock()
            .unwrap()
            .filters
            .by_handle(handle)
            .map(|f| f.queue_size(granted))
            .unwrap_or(0)
    }

    pub fn get_total_filter_queue_size(&self) -> usize {
        let granted = self.time_granted();
        self.registries
            .lock()
            .unwrap()
            .filters
            .iter()
            .map(|f| f.queue_size(granted))
            .sum()
    }

    fn next_value_time(&self) -> Time {
        self.registries
            .lock()
            .unwrap()
            .subscriptions
            .iter()
            .map(|s| s.next_value_time())
            .min()
            .unwrap_or(Time::MAX_VAL)
    }

    fn next_message_time(&self) -> Time {
        self.registries
            .lock()
            .unwrap()
            .endpoints
            .iter()
            .map(|e| e.first_message_time())
            .min()
            .unwrap_or(Time::MAX_VAL)
    }

    // ---- single-worker drainer protocol (spec §4.4) ---------------------

    /// A federate already in a terminal state answers every entry point
    /// immediately (spec §8 S6: "subsequent requestTime returns halted
    /// immediately") instead of claiming the worker token and draining an
    /// inbound queue that will never produce another terminal command.
    fn terminal_outcome(&self) -> Option<Convergence> {
        match self.state.get() {
            LifecycleState::Finished => Some(Convergence::Halted),
            LifecycleState::Error => Some(Convergence::Error),
            _ => None,
        }
    }

    fn claim_worker(&self) -> bool {
        self.processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release_worker(&self) {
        self.processing.store(false, Ordering::Release);
    }

    /// Spin-wait for the active worker to release the token, reclaim it just
    /// long enough to read lifecycle state, then release again — never calls
    /// `process_queue`. Documented as non-canonical (spec §9): a real
    /// deployment would replace this with a condition variable and forbid
    /// concurrent entry-point calls from the same federate.
    fn spectate(&self, default_outcome: Convergence) -> Convergence {
        loop {
            if self.claim_worker() {
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        let outcome = match self.state.get() {
            LifecycleState::Error => Convergence::Error,
            LifecycleState::Finished => Convergence::Halted,
            _ => default_outcome,
        };
        self.release_worker();
        outcome
    }

    pub fn wait_setup(&self) -> Convergence {
        if let Some(outcome) = self.terminal_outcome() {
            return outcome;
        }
        if self.claim_worker() {
            let outcome = self.process_queue();
            self.release_worker();
            Convergence::from(outcome)
        } else {
            self.spectate(Convergence::Nonconverged)
        }
    }

    pub fn enter_init_state(&self) -> Convergence {
        if let Some(outcome) = self.terminal_outcome() {
            return outcome;
        }
        if self.claim_worker() {
            let outcome = self.process_queue();
            if outcome == ConvergenceState::Complete {
                self.worker.lock().unwrap().time_granted = Time::INITIAL;
            }
            self.release_worker();
            Convergence::from(outcome)
        } else {
            self.spectate(Convergence::Nonconverged)
        }
    }

    pub fn enter_executing_state(&self, converged: ConvergenceState) -> Convergence {
        if let Some(outcome) = self.terminal_outcome() {
            return outcome;
        }
        if self.claim_worker() {
            self.coordinator.lock().unwrap().entering_exec_mode(converged);
            let outcome = self.process_queue();
            if outcome == ConvergenceState::Complete {
                let mut worker = self.worker.lock().unwrap();
                worker.time_granted = Time::ZERO;
                self.fill_event_vector(&mut worker, Time::ZERO);
            }
            self.release_worker();
            Convergence::from(outcome)
        } else {
            self.spectate(Convergence::Nonconverged)
        }
    }

    pub fn request_time(&self, next_time: Time, converged: ConvergenceState) -> TimeRequestResult {
        if let Some(outcome) = self.terminal_outcome() {
            return TimeRequestResult {
                granted_time: self.time_granted(),
                outcome,
                iterating: false,
            };
        }
        if self.claim_worker() {
            self.worker.lock().unwrap().events.clear();

            let next_value_time = self.next_value_time();
            let next_message_time = self.next_message_time();
            self.coordinator
                .lock()
                .unwrap()
                .time_request(next_time, converged, next_value_time, next_message_time);

            self.queue.push_local(ActionMessage::new(Command::TimeCheck));

            let outcome = self.process_queue();
            let granted_time = self.coordinator.lock().unwrap().granted_time();

            if outcome != ConvergenceState::Continue {
                let mut worker = self.worker.lock().unwrap();
                worker.time_granted = granted_time;
                self.fill_event_vector(&mut worker, granted_time);
            }
            self.release_worker();

            TimeRequestResult {
                granted_time,
                outcome: Convergence::from(outcome),
                iterating: outcome == ConvergenceState::Nonconverged,
            }
        } else {
            let outcome = self.spectate(Convergence::Nonconverged);
            TimeRequestResult {
                granted_time: self.time_granted(),
                iterating: outcome == Convergence::Nonconverged,
                outcome,
            }
        }
    }

    // ---- processQueue / processActionMessage (spec §4.5) -----------------

    fn process_queue(&self) -> ConvergenceState {
        let mut delay = {
            let mut worker = self.worker.lock().unwrap();
            std::mem::take(&mut worker.delay_queue)
        };

        let mut outcome = ConvergenceState::Continue;
        while let Some(cmd) = delay.pop_front() {
            outcome = self.process_action_message(&cmd);
            if outcome != ConvergenceState::Continue {
                break;
            }
        }

        if outcome != ConvergenceState::Continue {
            let mut worker = self.worker.lock().unwrap();
            delay.append(&mut worker.delay_queue);
            worker.delay_queue = delay;
            return outcome;
        }

        loop {
            let Some(cmd) = self.queue.pop() else {
                return ConvergenceState::Error;
            };
            let outcome = self.process_action_message(&cmd);
            if outcome != ConvergenceState::Continue {
                return outcome;
            }
        }
    }

    fn check_exec_entry_transition(&self) -> ConvergenceState {
        if self.state.get() != LifecycleState::Initializing {
            return ConvergenceState::Continue;
        }
        let outcome = self.coordinator.lock().unwrap().check_exec_entry();
        if outcome == ConvergenceState::Complete {
            self.state.set_state(LifecycleState::Executing);
        }
        outcome
    }

    fn check_time_grant_transition(&self) -> ConvergenceState {
        if self.state.get() != LifecycleState::Executing {
            return ConvergenceState::Continue;
        }
        self.coordinator.lock().unwrap().check_time_grant()
    }

    fn process_action_message(&self, cmd: &ActionMessage) -> ConvergenceState {
        let source = GlobalHandle::new(cmd.source_id, cmd.source_handle);

        match cmd.action {
            Command::Ignore => ConvergenceState::Continue,

            Command::InitGrant => {
                if self.state.get() == LifecycleState::Created && self.state.set_state(LifecycleState::Initializing) {
                    ConvergenceState::Complete
                } else {
                    ConvergenceState::Continue
                }
            }

            Command::ExecRequest | Command::ExecGrant => {
                let actionable = self.coordinator.lock().unwrap().process_time_message(cmd);
                if !actionable {
                    ConvergenceState::Continue
                } else {
                    self.check_exec_entry_transition()
                }
            }

            Command::ExecCheck => self.check_exec_entry_transition(),

            Command::Stop | Command::Disconnect => {
                if cmd.dest_id == FederateId::BROADCAST
                    || self.global_id().is_some_and(|id| id == cmd.dest_id)
                {
                    self.state.set_state(LifecycleState::Finished);
                    ConvergenceState::Halted
                } else {
                    ConvergenceState::Continue
                }
            }

            Command::TimeRequest | Command::TimeGrant => {
                let actionable = self.coordinator.lock().unwrap().process_time_message(cmd);
                if !actionable {
                    ConvergenceState::Continue
                } else {
                    self.check_time_grant_transition()
                }
            }

            Command::TimeCheck => self.check_time_grant_transition(),

            Command::SendMessage => {
                let impact = self.config.lock().unwrap().impact_window;
                let effective_time = cmd.action_time + impact;
                self.coordinator.lock().unwrap().update_message_time(cmd.action_time);
                let mut reg = self.registries.lock().unwrap();
                if let Some(ep) = reg.endpoints.by_handle_mut(cmd.dest_handle) {
                    ep.add_message(Message {
                        source,
                        dest: GlobalHandle::new(cmd.dest_id, cmd.dest_handle),
                        time: effective_time,
                        data: cmd.payload.clone().unwrap_or_else(|| Arc::from(Vec::new())),
                    });
                }
                ConvergenceState::Continue
            }

            Command::SendForFilter => {
                self.coordinator.lock().unwrap().update_message_time(cmd.action_time);
                let mut reg = self.registries.lock().unwrap();
                if let Some(filter) = reg.filters.by_handle_mut(cmd.dest_handle) {
                    filter.add_message(Message {
                        source,
                        dest: GlobalHandle::new(cmd.dest_id, cmd.dest_handle),
                        time: cmd.action_time,
                        data: cmd.payload.clone().unwrap_or_else(|| Arc::from(Vec::new())),
                    });
                }
                ConvergenceState::Continue
            }

            Command::Pub => {
                let impact = self.config.lock().unwrap().impact_window;
                let effective_time = cmd.action_time + impact;
                let mut reg = self.registries.lock().unwrap();
                if let Some(sub) = reg.subscriptions.by_handle_mut(cmd.dest_handle) {
                    sub.add_data(source, effective_time, 0, cmd.payload.clone().unwrap_or_else(|| Arc::from(Vec::new())));
                }
                drop(reg);
                self.coordinator.lock().unwrap().update_value_time(cmd.action_time);
                ConvergenceState::Continue
            }

            Command::Error => {
                self.state.set_state(LifecycleState::Error);
                ConvergenceState::Error
            }

            Command::RegPub | Command::NotifyPub => {
                let mut reg = self.registries.lock().unwrap();
                if let Some(sub) = reg.subscriptions.by_handle_mut(cmd.dest_handle) {
                    let pub_type = cmd.source_type.as_deref().unwrap_or("");
                    let pub_units = cmd.source_units.as_deref().unwrap_or("");
                    if let Err(err) = check_wiring_match(
                        "subscription",
                        sub.requested_type(),
                        sub.requested_units(),
                        pub_type,
                        pub_units,
                    ) {
                        *self.last_error.lock().unwrap() = Some(err);
                    } else {
                        let source_name = cmd.name.clone().unwrap_or_default();
                        sub.add_source(source, source_name, pub_type, pub_units);
                    }
                }
                drop(reg);
                self.coordinator.lock().unwrap().add_dependency(cmd.source_id);
                ConvergenceState::Continue
            }

            Command::RegSub | Command::NotifySub => {
                let mut reg = self.registries.lock().unwrap();
                if let Some(publication) = reg.publications.by_handle_mut(cmd.dest_handle) {
                    publication.add_subscriber(source);
                }
                drop(reg);
                self.coordinator.lock().unwrap().add_dependent(cmd.source_id);
                ConvergenceState::Continue
            }

            Command::RegEnd | Command::NotifyEnd => {
                let mut reg = self.registries.lock().unwrap();
                if let Some(filter) = reg.filters.by_handle_mut(cmd.dest_handle) {
                    let endpoint_type = cmd.source_type.as_deref().unwrap_or("");
                    let endpoint_units = cmd.source_units.as_deref().unwrap_or("");
                    if let Err(err) =
                        check_wiring_match("filter", filter.filter_type(), "", endpoint_type, endpoint_units)
                    {
                        *self.last_error.lock().unwrap() = Some(err);
                    } else {
                        filter.add_target(source);
                    }
                }
                drop(reg);
                self.coordinator.lock().unwrap().add_dependency(cmd.source_id);
                ConvergenceState::Continue
            }

            Command::AddDependency => {
                if self.global_id().is_some_and(|id| id == cmd.dest_id) {
                    self.coordinator.lock().unwrap().add_dependency(cmd.source_id);
                }
                ConvergenceState::Continue
            }

            Command::AddDependent => {
                if self.global_id().is_some_and(|id| id == cmd.dest_id) {
                    self.coordinator.lock().unwrap().add_dependent(cmd.source_id);
                }
                ConvergenceState::Continue
            }

            Command::RemoveDependency => {
                if self.global_id().is_some_and(|id| id == cmd.dest_id) {
                    self.coordinator.lock().unwrap().remove_dependency(cmd.source_id);
                }
                ConvergenceState::Continue
            }

            Command::RemoveDependent => {
                if self.global_id().is_some_and(|id| id == cmd.dest_id) {
                    self.coordinator.lock().unwrap().remove_dependent(cmd.source_id);
                }
                ConvergenceState::Continue
            }

            Command::RegDstFilter | Command::NotifyDstFilter => {
                let reg = self.registries.lock().unwrap();
                let exists = reg.endpoints.by_handle(cmd.dest_handle).is_some();
                drop(reg);
                if exists {
                    self.coordinator.lock().unwrap().add_dependency(cmd.source_id);
                }
                ConvergenceState::Continue
            }

            Command::RegSrcFilter | Command::NotifySrcFilter => {
                let mut reg = self.registries.lock().unwrap();
                if let Some(ep) = reg.endpoints.by_handle_mut(cmd.dest_handle) {
                    ep.mark_has_source_filter();
                }
                drop(reg);
                self.coordinator.lock().unwrap().add_dependent(cmd.source_id);
                ConvergenceState::Continue
            }

            Command::FedAck { error } => {
                if self.state.get() != LifecycleState::Created {
                    return ConvergenceState::Continue;
                }
                let my_name = self.config.lock().unwrap().name.clone();
                if cmd.name.as_deref() != Some(my_name.as_str()) {
                    return ConvergenceState::Continue;
                }
                if error {
                    self.state.set_state(LifecycleState::Error);
                    self.log(LogLevel::Error, "federation ack reported failure");
                    ConvergenceState::Error
                } else {
                    self.worker.lock().unwrap().global_id = Some(cmd.dest_id);
                    self.coordinator.lock().unwrap().set_source_id(cmd.dest_id);
                    ConvergenceState::Complete
                }
            }
        }
    }

    // ---- administrative overrides (spec §4.3) -----------------------------

    /// Force the federate back to `CREATED`, clearing events and discarding
    /// every subscription's buffered future data (spec §4.3 / DESIGN.md).
    pub fn reset(&self) {
        self.state.reset();
        let mut worker = self.worker.lock().unwrap();
        worker.events.clear();
        let mut reg = self.registries.lock().unwrap();
        for sub in reg.subscriptions.iter_mut() {
            sub.clear_future_data();
        }
    }

    /// Force the federate back to `INITIALIZING`, with the same data-hygiene
    /// side effects as `reset`.
    pub fn reinit(&self) {
        self.state.reinit();
        let mut worker = self.worker.lock().unwrap();
        worker.events.clear();
        let mut reg = self.registries.lock().unwrap();
        for sub in reg.subscriptions.iter_mut() {
            sub.clear_future_data();
        }
    }
}
