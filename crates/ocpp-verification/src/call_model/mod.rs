//! Stateright model for the per-session outbound-`call` correlation discipline.
//!
//! Explores every interleaving of issuing a server-initiated `Call`, replies
//! (matched or stale) arriving, the response deadline elapsing, and the
//! session disconnecting, and verifies that the `call_lock` / Pending-Call
//! Table invariants hold throughout.
//!
//! # Example
//!
//! ```
//! use ocpp_verification::call_model::CallModel;
//! use stateright::Checker;
//!
//! let model = CallModel::default();
//! let checker = model.checker().spawn_bfs().join();
//! assert!(checker.is_done());
//! ```

pub mod actions;
pub mod properties;
pub mod state;

use stateright::{Model, Property};

use self::{
    actions::{Action, apply_action, is_valid_action},
    properties::{
        call_lock_matches_pending_entry,
        can_deliver_matched_reply,
        can_disconnect_with_outstanding_call,
        can_drop_stale_reply,
        can_timeout_outstanding_call,
        delivered_replies_were_issued,
        pending_call_cleared_on_disconnect,
    },
    state::CallState,
};

/// Configuration for the call-correlation verification model.
///
/// Use [`CallModel::default()`] for conservative defaults suitable for
/// automated testing.
#[derive(Clone, Debug)]
pub struct CallModel {
    /// Pool of correlation ids actions may draw from. Two is the minimum
    /// needed to exercise a stale reply carrying a *different* id from the
    /// one actually outstanding.
    pub id_pool: Vec<u8>,
}

impl Default for CallModel {
    fn default() -> Self {
        Self { id_pool: vec![0, 1] }
    }
}

impl Model for CallModel {
    type State = CallState;
    type Action = Action;

    fn init_states(&self) -> Vec<Self::State> {
        vec![CallState::new()]
    }

    fn actions(&self, state: &Self::State, actions: &mut Vec<Self::Action>) {
        for &id in &self.id_pool {
            let issue = Action::IssueCall { id };
            if is_valid_action(state, &issue) {
                actions.push(issue);
            }
            let reply = Action::Reply { id };
            if is_valid_action(state, &reply) {
                actions.push(reply);
            }
        }
        if is_valid_action(state, &Action::Timeout) {
            actions.push(Action::Timeout);
        }
        if is_valid_action(state, &Action::Disconnect) {
            actions.push(Action::Disconnect);
        }
    }

    fn next_state(&self, state: &Self::State, action: Self::Action) -> Option<Self::State> {
        Some(apply_action(state, &action))
    }

    fn properties(&self) -> Vec<Property<Self>> {
        vec![
            // Safety properties
            call_lock_matches_pending_entry(),
            pending_call_cleared_on_disconnect(),
            delivered_replies_were_issued(),
            // Reachability properties
            can_deliver_matched_reply(),
            can_drop_stale_reply(),
            can_timeout_outstanding_call(),
            can_disconnect_with_outstanding_call(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use stateright::{Checker, HasDiscoveries};

    use super::*;
    use crate::call_model::properties::{
        CAN_DELIVER_MATCHED_REPLY_NAME,
        CAN_DISCONNECT_WITH_OUTSTANDING_CALL_NAME,
        CAN_DROP_STALE_REPLY_NAME,
        CAN_TIMEOUT_OUTSTANDING_CALL_NAME,
    };

    const MIN_STATE_COUNT: usize = 10;
    const TARGET_MAX_DEPTH: usize = 6;
    const TARGET_STATE_COUNT: usize = 1500;

    fn verify_bounded(model: CallModel) -> impl stateright::Checker<CallModel> {
        let reachability = reachability_property_names();
        model
            .checker()
            .target_max_depth(TARGET_MAX_DEPTH)
            .target_state_count(TARGET_STATE_COUNT)
            .finish_when(HasDiscoveries::AllOf(reachability))
            .spawn_bfs()
            .join()
    }

    fn reachability_property_names() -> BTreeSet<&'static str> {
        [
            CAN_DELIVER_MATCHED_REPLY_NAME,
            CAN_DROP_STALE_REPLY_NAME,
            CAN_TIMEOUT_OUTSTANDING_CALL_NAME,
            CAN_DISCONNECT_WITH_OUTSTANDING_CALL_NAME,
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn default_model_has_two_candidate_ids() {
        let model = CallModel::default();
        assert_eq!(model.id_pool, vec![0, 1]);
    }

    #[test]
    fn init_states_returns_single_connected_state() {
        let model = CallModel::default();
        let states = model.init_states();
        assert_eq!(states.len(), 1);
        let state = states.first().expect("state exists");
        assert!(state.connected);
    }

    #[test]
    fn actions_offer_issue_and_no_timeout_for_fresh_state() {
        let model = CallModel::default();
        let state = CallState::new();
        let mut actions = Vec::new();
        model.actions(&state, &mut actions);

        assert!(actions.iter().any(|a| matches!(a, Action::IssueCall { .. })));
        assert!(!actions.contains(&Action::Timeout));
        assert!(actions.contains(&Action::Disconnect));
    }

    #[test]
    fn properties_includes_safety_and_reachability() {
        let model = CallModel::default();
        let props = model.properties();
        assert!(props.len() >= 7);
        assert!(props.iter().any(|p| p.name.contains("call_lock")));
        assert!(props.iter().any(|p| p.name.contains("disconnect")));
    }

    #[test]
    fn model_verifies_successfully() {
        let checker = verify_bounded(CallModel::default());
        assert!(checker.unique_state_count() >= MIN_STATE_COUNT);
    }
}
