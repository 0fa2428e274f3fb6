//! Schema validation for decoded payloads.
//!
//! The schemas themselves are external inputs (see the Non-goals): this
//! module only classifies a typed-deserialization failure against a concrete
//! [`PayloadShape`](crate::version::PayloadShape) into the taxonomy kind
//! the Router needs in order to build the right `CallError`.

use serde_json::Value;

use crate::error::ErrorKind;

/// The outcome of validating a payload against a registered shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// The taxonomy kind this violation surfaces as.
    pub kind: ErrorKind,
    /// Human-readable description, forwarded into the CallError verbatim.
    pub description: String,
}

/// Attempt to deserialize `payload` into `T`, classifying any failure.
///
/// # Errors
///
/// Returns a [`SchemaViolation`] describing why `payload` does not match the
/// shape `T`, with `kind` set from a best-effort reading of `serde_json`'s
/// error message: "missing field" failures are cardinality violations,
/// "invalid type"/"invalid value" failures are type violations, anything
/// else falls back to a generic formation violation.
pub fn validate_shape<T>(payload: &Value) -> Result<T, SchemaViolation>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(payload.clone()).map_err(|err| {
        let message = err.to_string();
        let kind = if message.contains("missing field") {
            ErrorKind::OccurrenceConstraintViolation
        } else if message.contains("invalid type") || message.contains("invalid value") {
            ErrorKind::TypeConstraintViolation
        } else {
            ErrorKind::FormationViolation
        };
        SchemaViolation {
            kind,
            description: message,
        }
    })
}
