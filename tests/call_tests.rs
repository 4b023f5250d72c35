// Call signaling state machine: one call at a time, busy rejection, and the
// unanswered-call timeout.

mod common;

use chrono::{Duration, Utc};
use common::{test_contact, TestHarness};
use palaver::client::{CallKind, CallState, InboundEvent, OutboundEvent};

#[test]
fn outgoing_call_full_lifecycle() {
    let mut harness = TestHarness::logged_in("me");
    let start = Utc::now();

    harness
        .router
        .calls
        .initiate("alice", CallKind::Video)
        .unwrap();
    assert!(matches!(
        harness.router.calls.state(),
        CallState::Outgoing { peer_id, kind: CallKind::Video } if peer_id == "alice"
    ));

    harness.router.handle(InboundEvent::CallAnswered {
        receiver_id: "alice".to_string(),
    });
    assert!(matches!(
        harness.router.calls.state(),
        CallState::Active { .. }
    ));

    harness
        .router
        .calls
        .end(start + Duration::seconds(95))
        .unwrap();
    assert_eq!(*harness.router.calls.state(), CallState::Idle);

    let outbound = harness.drain_outbound();
    let end_event = outbound
        .iter()
        .find_map(|e| match e {
            OutboundEvent::EndCall {
                other_user_id,
                duration,
            } => Some((other_user_id.clone(), *duration)),
            _ => None,
        })
        .expect("end_call not emitted");
    assert_eq!(end_event.0, "alice");
    assert!(end_event.1 >= 90, "duration was {}", end_event.1);
}

#[test]
fn incoming_call_can_be_answered() {
    let mut harness = TestHarness::logged_in("me");
    let now = Utc::now();

    harness.router.handle(InboundEvent::IncomingCall {
        caller_id: "bob".to_string(),
        call_type: CallKind::Audio,
    });
    assert!(matches!(
        harness.router.calls.state(),
        CallState::Incoming { .. }
    ));

    harness.router.calls.answer(now).unwrap();
    assert!(matches!(
        harness.router.calls.state(),
        CallState::Active { peer_id, .. } if peer_id == "bob"
    ));

    let outbound = harness.drain_outbound();
    assert!(outbound
        .iter()
        .any(|e| matches!(e, OutboundEvent::AnswerCall { caller_id } if caller_id == "bob")));
}

#[test]
fn second_incoming_call_is_auto_rejected() {
    let mut harness = TestHarness::logged_in("me");
    harness
        .router
        .calls
        .initiate("alice", CallKind::Audio)
        .unwrap();
    harness.drain_outbound();

    harness.router.handle(InboundEvent::IncomingCall {
        caller_id: "bob".to_string(),
        call_type: CallKind::Audio,
    });

    // The existing call is untouched and the intruder gets a reject.
    assert!(matches!(
        harness.router.calls.state(),
        CallState::Outgoing { peer_id, .. } if peer_id == "alice"
    ));
    let outbound = harness.drain_outbound();
    assert!(matches!(
        outbound.as_slice(),
        [OutboundEvent::RejectCall { caller_id }] if caller_id == "bob"
    ));
}

#[test]
fn cannot_initiate_while_in_a_call() {
    let mut harness = TestHarness::logged_in("me");
    harness
        .router
        .calls
        .initiate("alice", CallKind::Audio)
        .unwrap();

    assert!(harness
        .router
        .calls
        .initiate("bob", CallKind::Video)
        .is_err());
}

#[test]
fn unanswered_incoming_call_expires() {
    let mut harness = TestHarness::logged_in("me");
    let now = Utc::now();
    harness.router.handle(InboundEvent::IncomingCall {
        caller_id: "bob".to_string(),
        call_type: CallKind::Video,
    });

    // Just before the deadline nothing happens.
    harness.router.calls.expire_stale(now + Duration::seconds(5));
    assert!(matches!(
        harness.router.calls.state(),
        CallState::Incoming { .. }
    ));

    harness
        .router
        .calls
        .expire_stale(now + Duration::seconds(31));
    assert_eq!(*harness.router.calls.state(), CallState::Idle);
}

#[test]
fn rejection_by_peer_ends_outgoing_call_with_notice() {
    let mut harness = TestHarness::logged_in("me");
    harness
        .router
        .store
        .set_contacts(vec![test_contact("alice", "Alice")]);
    harness
        .router
        .calls
        .initiate("alice", CallKind::Video)
        .unwrap();
    harness.drain_notices();

    harness.router.handle(InboundEvent::CallRejected {
        receiver_id: "alice".to_string(),
    });

    assert_eq!(*harness.router.calls.state(), CallState::Idle);
    let notices = harness.drain_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("Alice"));
}

#[test]
fn remote_hangup_notifies_only_the_other_party() {
    let mut harness = TestHarness::logged_in("me");
    harness.router.handle(InboundEvent::IncomingCall {
        caller_id: "bob".to_string(),
        call_type: CallKind::Audio,
    });
    harness.router.calls.answer(Utc::now()).unwrap();
    harness.drain_notices();

    harness.router.handle(InboundEvent::CallEnded {
        ended_by: "bob".to_string(),
    });

    assert_eq!(*harness.router.calls.state(), CallState::Idle);
    assert_eq!(harness.drain_notices().len(), 1);
}
