use super::*;

#[test]
fn issue_call_takes_the_lock_and_records_the_id() {
    let state = CallState::new();
    let next = apply_action(&state, &Action::IssueCall { id: 1 });
    assert!(next.call_lock_held);
    assert_eq!(next.pending_id, Some(1));
    assert_eq!(next.effects, vec![Effect::CallIssued { id: 1 }]);
}

#[test]
fn matching_reply_releases_the_lock() {
    let mut state = CallState::new();
    state.call_lock_held = true;
    state.pending_id = Some(7);
    let next = apply_action(&state, &Action::Reply { id: 7 });
    assert!(!next.call_lock_held);
    assert_eq!(next.pending_id, None);
    assert_eq!(next.effects, vec![Effect::ReplyDelivered { id: 7 }]);
}

#[test]
fn stale_reply_is_dropped_without_releasing_the_lock() {
    let mut state = CallState::new();
    state.call_lock_held = true;
    state.pending_id = Some(7);
    let next = apply_action(&state, &Action::Reply { id: 9 });
    assert!(next.call_lock_held);
    assert_eq!(next.pending_id, Some(7));
    assert_eq!(next.effects, vec![Effect::ReplyDropped { id: 9 }]);
}

#[test]
fn unexpected_reply_with_nothing_outstanding_is_dropped() {
    let state = CallState::new();
    let next = apply_action(&state, &Action::Reply { id: 3 });
    assert!(!next.call_lock_held);
    assert_eq!(next.effects, vec![Effect::ReplyDropped { id: 3 }]);
}

#[test]
fn timeout_releases_the_lock() {
    let mut state = CallState::new();
    state.call_lock_held = true;
    state.pending_id = Some(2);
    let next = apply_action(&state, &Action::Timeout);
    assert!(!next.call_lock_held);
    assert_eq!(next.pending_id, None);
    assert_eq!(next.effects, vec![Effect::TimedOut { id: 2 }]);
}

#[test]
fn timeout_with_nothing_outstanding_is_a_no_op() {
    let state = CallState::new();
    let next = apply_action(&state, &Action::Timeout);
    assert_eq!(next.effects, Vec::new());
}

#[test]
fn disconnect_clears_outstanding_call_and_records_it() {
    let mut state = CallState::new();
    state.call_lock_held = true;
    state.pending_id = Some(4);
    let next = apply_action(&state, &Action::Disconnect);
    assert!(!next.connected);
    assert!(!next.call_lock_held);
    assert_eq!(next.pending_id, None);
    assert_eq!(
        next.effects,
        vec![Effect::Disconnected { had_outstanding: true }]
    );
}

#[test]
fn is_valid_action_forbids_issuing_while_locked() {
    let mut state = CallState::new();
    state.call_lock_held = true;
    assert!(!is_valid_action(&state, &Action::IssueCall { id: 1 }));
}

#[test]
fn is_valid_action_forbids_timeout_without_an_outstanding_call() {
    let state = CallState::new();
    assert!(!is_valid_action(&state, &Action::Timeout));
}

#[test]
fn is_valid_action_forbids_everything_once_disconnected() {
    let mut state = CallState::new();
    state.connected = false;
    assert!(!is_valid_action(&state, &Action::Reply { id: 1 }));
    assert!(!is_valid_action(&state, &Action::Disconnect));
}
