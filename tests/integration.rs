//! End-to-end coverage of the universal properties and scenarios in
//! `SPEC_FULL.md` §8, driven entirely through `FederateState`'s public API
//! with the `test-support` loopback coordinator standing in for a real
//! broker/time-negotiation peer.

use std::sync::Arc;
use std::thread;

use cosim_federate::coordinator::loopback::LoopbackCoordinator;
use cosim_federate::{
    ActionMessage, Command, Convergence, ConvergenceState, FederateConfig, FederateId,
    FederateState, Handle, LifecycleState, Time,
};

fn new_federate(name: &str) -> FederateState {
    FederateState::new(FederateConfig::new(name), Box::new(LoopbackCoordinator::new()))
}

/// Property 1: lifecycle only ever advances CREATED -> INITIALIZING ->
/// EXECUTING -> FINISHED, never backwards, across a realistic call sequence.
#[test]
fn lifecycle_advances_monotonically_through_lifecycle() {
    let fed = new_federate("f1");
    fed.sender().add_action(
        ActionMessage::new(Command::FedAck { error: false })
            .with_dest(FederateId::new(1), Handle::INVALID)
            .with_name("f1"),
    );
    assert_eq!(fed.wait_setup(), Convergence::Complete);
    assert_eq!(fed.state(), LifecycleState::Created);

    fed.sender().add_action(ActionMessage::new(Command::InitGrant));
    assert_eq!(fed.enter_init_state(), Convergence::Complete);
    assert_eq!(fed.state(), LifecycleState::Initializing);

    fed.sender().add_action(ActionMessage::new(Command::ExecCheck));
    assert_eq!(
        fed.enter_executing_state(ConvergenceState::Complete),
        Convergence::Complete
    );
    assert_eq!(fed.state(), LifecycleState::Executing);

    fed.sender()
        .add_action(ActionMessage::new(Command::Disconnect).with_dest(FederateId::BROADCAST, Handle::INVALID));
    let result = fed.request_time(Time::from(1), ConvergenceState::Complete);
    assert_eq!(result.outcome, Convergence::Halted);
    assert_eq!(fed.state(), LifecycleState::Finished);
}

/// Property 2: two threads racing entry points on the same federate never
/// observe a torn `time_granted`/`events` pair — exactly one becomes the
/// worker and the other returns a synthesized spectator outcome.
#[test]
fn concurrent_entry_points_never_corrupt_shared_state() {
    let fed = Arc::new(new_federate("racer"));
    fed.sender().add_action(
        ActionMessage::new(Command::FedAck { error: false })
            .with_dest(FederateId::new(7), Handle::INVALID)
            .with_name("racer"),
    );

    let a = Arc::clone(&fed);
    let t1 = thread::spawn(move || a.wait_setup());
    let t2 = thread::spawn(move || fed.wait_setup());

    let r1 = t1.join().unwrap();
    let r2 = t2.join().unwrap();

    // Exactly one call observes the FED_ACK directly; the other, whichever
    // way the race falls, must see a consistent post-ack or pre-ack state —
    // never a panic, never both claiming completion from two different acks.
    assert!(matches!(r1, Convergence::Complete | Convergence::Nonconverged));
    assert!(matches!(r2, Convergence::Complete | Convergence::Nonconverged));
}

/// Property 7: CMD_PUB's revealed timestamp is offset by the configured
/// impact window.
#[test]
fn impact_window_offsets_revealed_publish_time() {
    let fed = new_federate("f2");
    fed.update_config(FederateConfig {
        impact_window: Time::from(5),
        ..FederateConfig::new("f2")
    });

    fed.sender().add_action(
        ActionMessage::new(Command::FedAck { error: false })
            .with_dest(FederateId::new(2), Handle::INVALID)
            .with_name("f2"),
    );
    fed.wait_setup();
    fed.sender().add_action(ActionMessage::new(Command::InitGrant));
    fed.enter_init_state();
    fed.sender().add_action(ActionMessage::new(Command::ExecCheck));
    fed.enter_executing_state(ConvergenceState::Complete);
    assert_eq!(fed.state(), LifecycleState::Executing);

    let sub = fed.create_subscription("x", "double", "", true).unwrap();
    fed.sender().add_action(
        ActionMessage::new(Command::NotifyPub)
            .with_source(FederateId::new(3), Handle::new(0))
            .with_dest(FederateId::default(), sub)
            .with_name("x"),
    );
    fed.sender().add_action(
        ActionMessage::new(Command::Pub)
            .with_source(FederateId::new(3), Handle::new(0))
            .with_dest(FederateId::default(), sub)
            .with_time(Time::from(10)),
    );
    fed.sender().add_action(ActionMessage::new(Command::TimeCheck));

    fed.with_coordinator_any(|any| {
        any.downcast_mut::<LoopbackCoordinator>().unwrap().next_grant = Time::from(15);
    });
    let result = fed.request_time(Time::from(15), ConvergenceState::Complete);
    assert_eq!(result.outcome, Convergence::Complete);

    let revealed_time = fed
        .with_subscription(sub, |s| s.current_data_time(0))
        .flatten();
    assert_eq!(revealed_time.map(|(t, _)| t), Some(Time::from(15)));
}

/// S6, extended: once FINISHED, every subsequent entry point call returns
/// `halted` immediately without touching the coordinator again.
#[test]
fn halted_federate_stays_halted_across_repeated_calls() {
    let fed = new_federate("f3");
    fed.sender()
        .add_action(ActionMessage::new(Command::Stop).with_dest(FederateId::BROADCAST, Handle::INVALID));
    assert_eq!(fed.wait_setup(), Convergence::Halted);

    for _ in 0..3 {
        let result = fed.request_time(Time::from(1), ConvergenceState::Complete);
        assert_eq!(result.outcome, Convergence::Halted);
        assert_eq!(fed.state(), LifecycleState::Finished);
    }
}
