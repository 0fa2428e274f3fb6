//! Action types and the transition function for the call-correlation model.

use super::state::{CallState, Effect};

/// Actions that can be taken against a [`CallState`].
///
/// Each action represents one step of the outbound-`call` lifecycle
/// (`Router::call`, `PendingCallTable`, `run_inbound_pump`'s disconnect
/// teardown): issuing a call, a reply arriving (matched or stale), the
/// response deadline elapsing, or the session disconnecting.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Action {
    /// Issue an outbound `Call` with correlation id `id`.
    IssueCall {
        /// The correlation id to assign.
        id: u8,
    },
    /// A `CallResult`/`CallError` carrying `id` arrives. Whether it matches
    /// the outstanding call (and so is delivered) or not (and so is dropped)
    /// is decided by [`apply_action`] from the current state, not by this
    /// action itself — modelling that the Correlation Engine, not the
    /// network, decides delivery.
    Reply {
        /// The correlation id the reply carries.
        id: u8,
    },
    /// The outstanding call's response deadline elapses.
    Timeout,
    /// The session disconnects.
    Disconnect,
}

/// Returns `true` if `action` is a legal step from `state`.
///
/// Mirrors the guards actually enforced by the router: `IssueCall` requires
/// the `call_lock` to be free (serialization, §3 invariant 2); `Timeout`
/// requires a call to be outstanding; nothing is legal once disconnected.
#[must_use]
pub const fn is_valid_action(state: &CallState, action: &Action) -> bool {
    if !state.connected {
        return false;
    }
    match *action {
        Action::IssueCall { .. } => !state.call_lock_held,
        Action::Reply { .. } => true,
        Action::Timeout => state.pending_id.is_some(),
        Action::Disconnect => true,
    }
}

/// Applies `action` to `state`, returning the resulting state.
///
/// Pure function; does not modify `state`. The transition semantics mirror
/// `Router::call` and `PendingCallTable`:
///
/// - **`IssueCall`**: takes the `call_lock`, records the correlation id.
/// - **`Reply`**: releases the `call_lock` and clears the pending id only if
///   the reply's id matches; any other id (or no outstanding call at all) is
///   dropped without touching the lock, mirroring `route_message`'s handling
///   of an unknown `unique_id`.
/// - **`Timeout`**: releases the `call_lock` as `correlation::await_reply`
///   does on a deadline.
/// - **`Disconnect`**: clears the `call_lock` and pending id unconditionally,
///   mirroring `run_inbound_pump`'s teardown evicting outstanding calls.
#[must_use]
pub fn apply_action(state: &CallState, action: &Action) -> CallState {
    let mut next = state.clone();
    match *action {
        Action::IssueCall { id } => apply_issue_call(&mut next, id),
        Action::Reply { id } => apply_reply(&mut next, id),
        Action::Timeout => apply_timeout(&mut next),
        Action::Disconnect => apply_disconnect(&mut next),
    }
    next
}

fn apply_issue_call(state: &mut CallState, id: u8) {
    state.call_lock_held = true;
    state.pending_id = Some(id);
    state.effects.push(Effect::CallIssued { id });
}

fn apply_reply(state: &mut CallState, id: u8) {
    if state.pending_id == Some(id) {
        state.call_lock_held = false;
        state.pending_id = None;
        state.effects.push(Effect::ReplyDelivered { id });
    } else {
        state.effects.push(Effect::ReplyDropped { id });
    }
}

fn apply_timeout(state: &mut CallState) {
    let Some(id) = state.pending_id else {
        return;
    };
    state.call_lock_held = false;
    state.pending_id = None;
    state.effects.push(Effect::TimedOut { id });
}

fn apply_disconnect(state: &mut CallState) {
    let had_outstanding = state.pending_id.is_some();
    state.connected = false;
    state.call_lock_held = false;
    state.pending_id = None;
    state.effects.push(Effect::Disconnected { had_outstanding });
}

#[cfg(test)]
mod tests;
