//! Safety and reachability property definitions for the call-correlation model.
//!
//! - **Safety properties** ("always"): must hold in every reachable state.
//! - **Reachability properties** ("sometimes"): must be reachable on at least
//!   one path, confirming the model actually exercises the path in question.

use stateright::Property;

use super::{
    CallModel,
    state::{CallState, Effect},
};

/// Safety property: the `call_lock` is held exactly when a call is pending.
///
/// This is the model-level statement of §3 invariant 2/3: a session has at
/// most one outbound call in flight, tracked consistently by the
/// `call_lock`/Pending-Call-Table pair.
#[must_use]
pub fn call_lock_matches_pending_entry() -> Property<CallModel> {
    Property::always(
        "call_lock held iff a call is pending",
        |_model, state: &CallState| state.call_lock_held == state.pending_id.is_some(),
    )
}

/// Safety property: once disconnected, no call remains outstanding.
///
/// This is §3 invariant 5: the Pending-Call Table is empty after disconnect.
#[must_use]
pub fn pending_call_cleared_on_disconnect() -> Property<CallModel> {
    Property::always(
        "no outstanding call once disconnected",
        |_model, state: &CallState| state.connected || (state.pending_id.is_none() && !state.call_lock_held),
    )
}

/// Safety property: every delivered reply matches a call that was actually issued.
///
/// Verifies the Correlation Engine never manufactures a match: a
/// `ReplyDelivered { id }` effect is only recorded by [`super::actions::apply_action`]
/// when `id` equals the currently pending id, so a prior `CallIssued { id }`
/// for the same id must appear earlier in the history.
#[must_use]
pub fn delivered_replies_were_issued() -> Property<CallModel> {
    Property::always("every delivered reply was issued", |_model, state: &CallState| {
        for (index, effect) in state.effects.iter().enumerate() {
            let Effect::ReplyDelivered { id } = effect else {
                continue;
            };
            let issued_before = state
                .effects
                .iter()
                .take(index)
                .any(|prior| matches!(prior, Effect::CallIssued { id: issued_id } if issued_id == id));
            if !issued_before {
                return false;
            }
        }
        true
    })
}

/// Reachability property name: a reply is delivered to its matching call.
pub const CAN_DELIVER_MATCHED_REPLY_NAME: &str = "can deliver a matched reply";
/// Reachability property name: a stale/unmatched reply is dropped.
pub const CAN_DROP_STALE_REPLY_NAME: &str = "can drop a stale reply";
/// Reachability property name: an outstanding call times out.
pub const CAN_TIMEOUT_OUTSTANDING_CALL_NAME: &str = "can time out an outstanding call";
/// Reachability property name: a session disconnects while a call is outstanding.
pub const CAN_DISCONNECT_WITH_OUTSTANDING_CALL_NAME: &str = "can disconnect with a call outstanding";

fn has_effect(state: &CallState, predicate: impl Fn(&Effect) -> bool) -> bool {
    state.effects.iter().any(predicate)
}

/// Reachability property: some path delivers a reply to its matching call.
#[must_use]
pub fn can_deliver_matched_reply() -> Property<CallModel> {
    Property::sometimes(CAN_DELIVER_MATCHED_REPLY_NAME, |_model, state: &CallState| {
        has_effect(state, |effect| matches!(effect, Effect::ReplyDelivered { .. }))
    })
}

/// Reachability property: some path drops a stale or unmatched reply.
#[must_use]
pub fn can_drop_stale_reply() -> Property<CallModel> {
    Property::sometimes(CAN_DROP_STALE_REPLY_NAME, |_model, state: &CallState| {
        has_effect(state, |effect| matches!(effect, Effect::ReplyDropped { .. }))
    })
}

/// Reachability property: some path times out an outstanding call.
#[must_use]
pub fn can_timeout_outstanding_call() -> Property<CallModel> {
    Property::sometimes(CAN_TIMEOUT_OUTSTANDING_CALL_NAME, |_model, state: &CallState| {
        has_effect(state, |effect| matches!(effect, Effect::TimedOut { .. }))
    })
}

/// Reachability property: some path disconnects while a call is outstanding,
/// exercising `run_inbound_pump`'s teardown eviction.
#[must_use]
pub fn can_disconnect_with_outstanding_call() -> Property<CallModel> {
    Property::sometimes(CAN_DISCONNECT_WITH_OUTSTANDING_CALL_NAME, |_model, state: &CallState| {
        has_effect(
            state,
            |effect| matches!(effect, Effect::Disconnected { had_outstanding: true }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_model::state::CallState;

    #[test]
    fn lock_matches_pending_holds_for_fresh_state() {
        let state = CallState::new();
        assert_eq!(state.call_lock_held, state.pending_id.is_some());
    }

    #[test]
    fn delivered_replies_were_issued_rejects_a_fabricated_match() {
        let mut state = CallState::new();
        state.effects.push(Effect::ReplyDelivered { id: 5 });
        let violated = state.effects.iter().enumerate().any(|(index, effect)| {
            let Effect::ReplyDelivered { id } = effect else {
                return false;
            };
            !state
                .effects
                .iter()
                .take(index)
                .any(|prior| matches!(prior, Effect::CallIssued { id: issued_id } if issued_id == id))
        });
        assert!(violated);
    }
}
