//! Verification harness for the Stateright call-correlation model.

mod verification_harness;

use ocpp_verification::call_model::CallModel;
use rstest::rstest;
use verification_harness::{MIN_STATE_COUNT, verify_call_model};

#[rstest]
#[case("default config", CallModel::default())]
#[case("single id", CallModel { id_pool: vec![0] })]
#[case("three ids", CallModel { id_pool: vec![0, 1, 2] })]
fn call_model_verifies(#[case] name: &str, #[case] model: CallModel) {
    let summary = verify_call_model(&model);
    assert!(
        summary.is_verified(),
        "case {name}: reachability missing: {}, safety counterexamples: {}",
        summary.missing_reachability,
        summary.safety_counterexamples
    );
    assert!(
        summary.unique_state_count >= MIN_STATE_COUNT,
        "case {name}: expected >= {MIN_STATE_COUNT} states, got {}",
        summary.unique_state_count
    );
}
