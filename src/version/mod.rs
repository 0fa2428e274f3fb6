//! Version Adapter: maps a negotiated subprotocol to its action → payload
//! vocabulary.
//!
//! This is the only module permitted to know which payload shapes belong to
//! which OCPP version; the Router never imports anything from here directly
//! beyond the [`Subprotocol`] tag and the opaque [`PayloadShape`] lookups.

pub mod actions;

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::codec::{SchemaViolation, validate_shape};

/// The closed set of OCPP-J subprotocols this runtime speaks.
///
/// Negotiation order (§4.G): `2.0.1` beats `2.0` beats `1.6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subprotocol {
    /// `ocpp1.6`
    V16,
    /// `ocpp2.0`
    V20,
    /// `ocpp2.0.1`
    V201,
}

impl Subprotocol {
    /// The exact `Sec-WebSocket-Protocol` token for this version.
    #[must_use]
    pub const fn wire_tag(self) -> &'static str {
        match self {
            Self::V16 => "ocpp1.6",
            Self::V20 => "ocpp2.0",
            Self::V201 => "ocpp2.0.1",
        }
    }

    /// Parse a `Sec-WebSocket-Protocol` token into a [`Subprotocol`].
    #[must_use]
    pub fn from_wire_tag(tag: &str) -> Option<Self> {
        match tag {
            "ocpp1.6" => Some(Self::V16),
            "ocpp2.0" => Some(Self::V20),
            "ocpp2.0.1" => Some(Self::V201),
            _ => None,
        }
    }

    /// Negotiation ranking, highest-preference first, per §4.G.
    #[must_use]
    pub const fn ranked_order() -> [Self; 3] {
        [Self::V201, Self::V20, Self::V16]
    }
}

/// Direction of a payload within one action's exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The `Call` payload.
    Request,
    /// The `CallResult` payload.
    Response,
}

/// A registered payload shape: validates a decoded (snake_case) [`Value`]
/// against a concrete Rust type and reports back a typed value on success.
pub trait PayloadShape: Send + Sync {
    /// Validate `payload` against this shape.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaViolation`] describing why the payload does not match.
    fn validate(&self, payload: &Value) -> Result<(), SchemaViolation>;
}

struct TypedShape<T> {
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> TypedShape<T> {
    const fn new() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: DeserializeOwned + Send + Sync> PayloadShape for TypedShape<T> {
    fn validate(&self, payload: &Value) -> Result<(), SchemaViolation> {
        validate_shape::<T>(payload).map(|_: T| ())
    }
}

/// Key into the per-version action vocabulary: an action name plus direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VocabularyKey {
    action: String,
    direction_is_response: bool,
}

/// Immutable `(version_tag, vocabulary)` record: one per subprotocol, the
/// set fixed at process start (§3).
pub struct VersionAdapter {
    subprotocol: Subprotocol,
    vocabulary: HashMap<VocabularyKey, Box<dyn PayloadShape>>,
}

impl VersionAdapter {
    /// Build an empty adapter for `subprotocol`; actions are registered via
    /// [`VersionAdapter::register`].
    #[must_use]
    pub fn new(subprotocol: Subprotocol) -> Self {
        Self {
            subprotocol,
            vocabulary: HashMap::new(),
        }
    }

    /// The subprotocol this adapter serves.
    #[must_use]
    pub const fn subprotocol(&self) -> Subprotocol {
        self.subprotocol
    }

    /// Register the shape for `action`'s payload in the given `direction`.
    pub fn register<T: DeserializeOwned + Send + Sync + 'static>(
        &mut self,
        action: impl Into<String>,
        direction: Direction,
    ) -> &mut Self {
        let key = VocabularyKey {
            action: action.into(),
            direction_is_response: matches!(direction, Direction::Response),
        };
        self.vocabulary.insert(key, Box::new(TypedShape::<T>::new()));
        self
    }

    /// Look up the shape for `action` in the given `direction`, if one was
    /// registered for this subprotocol.
    ///
    /// Actions not present here are still routable — the Router falls back
    /// to `skip_schema_validation` semantics, never to `NotImplemented`: the
    /// fixed registry only gains validation, it does not gate reachability.
    #[must_use]
    pub fn shape_for(&self, action: &str, direction: Direction) -> Option<&dyn PayloadShape> {
        let key = VocabularyKey {
            action: action.to_owned(),
            direction_is_response: matches!(direction, Direction::Response),
        };
        self.vocabulary.get(&key).map(AsRef::as_ref)
    }
}

/// Build the fixed registry of adapters for every subprotocol this runtime
/// speaks, populated with the representative action set named in §4.B:
/// `BootNotification`, `Heartbeat`, `Authorize`, `StatusNotification`,
/// `GetLocalListVersion`, `DataTransfer`.
///
/// Hosts that need further actions' shapes register them against the
/// adapter for the relevant [`Subprotocol`] before the [`crate::shell::ApplicationShell`]
/// starts accepting sessions; this registry is never discovered dynamically
/// by formatting `f"{Action}Payload"`-style names (§9).
#[must_use]
pub fn default_registry() -> HashMap<Subprotocol, VersionAdapter> {
    let mut registry = HashMap::new();
    for subprotocol in Subprotocol::ranked_order() {
        let mut adapter = VersionAdapter::new(subprotocol);
        actions::register_defaults(&mut adapter, subprotocol);
        registry.insert(subprotocol, adapter);
    }
    registry
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case("ocpp1.6", Some(Subprotocol::V16))]
    #[case("ocpp2.0", Some(Subprotocol::V20))]
    #[case("ocpp2.0.1", Some(Subprotocol::V201))]
    #[case("ocpp9.9", None)]
    fn parses_wire_tags(#[case] tag: &str, #[case] expected: Option<Subprotocol>) {
        assert_eq!(Subprotocol::from_wire_tag(tag), expected);
    }

    #[rstest]
    fn ranked_order_prefers_newest_first() {
        assert_eq!(
            Subprotocol::ranked_order(),
            [Subprotocol::V201, Subprotocol::V20, Subprotocol::V16]
        );
    }

    #[rstest]
    fn unregistered_action_has_no_shape() {
        let adapter = VersionAdapter::new(Subprotocol::V16);
        assert!(
            adapter
                .shape_for("SomethingHostSpecific", Direction::Request)
                .is_none()
        );
    }

    #[rstest]
    fn registered_action_validates_its_shape() {
        let mut adapter = VersionAdapter::new(Subprotocol::V201);
        adapter.register::<actions::HeartbeatRequest>("Heartbeat", Direction::Request);
        let shape = adapter
            .shape_for("Heartbeat", Direction::Request)
            .expect("registered");
        assert!(shape.validate(&json!({})).is_ok());
    }

    #[rstest]
    fn default_registry_covers_every_subprotocol() {
        let registry = default_registry();
        for subprotocol in Subprotocol::ranked_order() {
            assert!(registry.contains_key(&subprotocol));
        }
    }
}
