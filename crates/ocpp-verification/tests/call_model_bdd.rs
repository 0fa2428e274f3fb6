//! Behaviour-driven tests for the call-correlation verification model.

mod verification_harness;

use std::cell::RefCell;

use ocpp_verification::call_model::CallModel;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use stateright::Model;
use verification_harness::{MIN_STATE_COUNT, verify_call_model};

#[derive(Clone, Copy, Debug, Default)]
struct VerificationResult {
    ran: bool,
    properties_verified: bool,
    unique_state_count: usize,
    missing_reachability: usize,
    safety_counterexamples: usize,
}

struct VerificationWorld {
    model: RefCell<CallModel>,
    result: RefCell<Option<VerificationResult>>,
}

impl VerificationWorld {
    fn new() -> Self {
        Self {
            model: RefCell::new(CallModel::default()),
            result: RefCell::new(None),
        }
    }

    fn set_model(&self, model: CallModel) {
        *self.model.borrow_mut() = model;
    }

    fn verify(&self) {
        let model = self.model.borrow().clone();
        let outcome = verify_call_model(&model);
        let result = VerificationResult {
            ran: true,
            properties_verified: outcome.is_verified(),
            unique_state_count: outcome.unique_state_count,
            missing_reachability: outcome.missing_reachability,
            safety_counterexamples: outcome.safety_counterexamples,
        };
        self.result.replace(Some(result));
    }

    fn result(&self) -> VerificationResult {
        self.result
            .borrow()
            .map_or_else(|| panic!("verification not executed"), |result| result)
    }
}

#[fixture]
fn world() -> VerificationWorld {
    let world = VerificationWorld::new();
    debug_assert!(world.result.borrow().is_none(), "verification results start empty");
    world
}

#[given("the call-correlation model uses default bounds")]
fn given_default_model(world: &VerificationWorld) {
    world.set_model(CallModel::default());
}

#[when("I verify the call-correlation model")]
fn when_verify_model(world: &VerificationWorld) {
    world.verify();
}

#[then("the verification completes")]
fn then_verification_completes(world: &VerificationWorld) {
    assert!(world.result().ran);
}

#[then("the properties are satisfied")]
fn then_properties_satisfied(world: &VerificationWorld) {
    let result = world.result();
    assert!(
        result.properties_verified,
        "reachability missing: {}, safety counterexamples: {}",
        result.missing_reachability, result.safety_counterexamples
    );
}

#[then("the model explores at least {count} states")]
fn then_state_space_size(world: &VerificationWorld, count: usize) {
    debug_assert!(
        count >= MIN_STATE_COUNT,
        "feature expectations should not undercut the harness minimum"
    );
    assert!(
        world.result().unique_state_count >= count,
        "expected at least {count} states, got {}",
        world.result().unique_state_count
    );
}

#[then("the model includes the disconnect-with-outstanding-call property")]
fn then_disconnect_property(world: &VerificationWorld) {
    let properties = world.model.borrow().properties();
    assert!(properties.iter().any(|property| property.name.contains("disconnect")));
}

#[scenario(path = "../../tests/features/call_model_verification.feature", index = 0)]
fn call_model_verifies_default_bounds(world: VerificationWorld) {
    let _ = world;
}

#[scenario(path = "../../tests/features/call_model_verification.feature", index = 1)]
fn call_model_explores_state_space(world: VerificationWorld) {
    let _ = world;
}

#[scenario(path = "../../tests/features/call_model_verification.feature", index = 2)]
fn call_model_registers_disconnect_property(world: VerificationWorld) {
    let _ = world;
}
