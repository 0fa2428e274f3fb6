//! The OCPP-J wire envelope: `Call` / `CallResult` / `CallError`.
//!
//! Framing is identical across every OCPP subprotocol this runtime speaks; it
//! is a JSON array whose first element is the message-type id.

use serde_json::Value;
use thiserror::Error;

const MSG_TYPE_CALL: u64 = 2;
const MSG_TYPE_CALL_RESULT: u64 = 3;
const MSG_TYPE_CALL_ERROR: u64 = 4;

/// A decoded OCPP-J frame, version-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `[2, uniqueId, action, payload]` — a request.
    Call {
        /// Correlates this request with its eventual reply.
        unique_id: String,
        /// The protocol action name, e.g. `BootNotification`.
        action: String,
        /// The request payload, keys still in wire (lowerCamelCase) form.
        payload: Value,
    },
    /// `[3, uniqueId, payload]` — a successful reply.
    CallResult {
        /// The `unique_id` of the `Call` this replies to.
        unique_id: String,
        /// The response payload, keys still in wire form.
        payload: Value,
    },
    /// `[4, uniqueId, errorCode, errorDescription, errorDetails]` — a failed reply.
    CallError {
        /// The `unique_id` of the `Call` this replies to.
        unique_id: String,
        /// The OCPP-J `errorCode` string (see [`crate::error::ErrorKind`]).
        error_code: String,
        /// Free-form human-readable description.
        error_description: String,
        /// Structured error details, if any.
        error_details: Value,
    },
}

/// Errors that can occur while decoding a wire frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The text was not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    /// The JSON value was not an array.
    #[error("frame is not a JSON array")]
    NotAnArray,
    /// The array's first element was not an integer message-type id.
    #[error("message-type id is not an integer")]
    InvalidMessageType,
    /// The message-type id was not one of `{2, 3, 4}`.
    #[error("unknown message-type id {0}")]
    UnknownMessageType(u64),
    /// The array's arity did not match its message type exactly.
    #[error("expected exactly {expected} fields, got {got}")]
    MissingFields {
        /// The exact arity required for this message type.
        expected: usize,
        /// The arity actually observed.
        got: usize,
    },
    /// A field that must be a string was some other JSON type.
    #[error("field type mismatch: {0}")]
    FieldTypeMismatch(&'static str),
}

impl Frame {
    /// Decode a raw wire-format OCPP-J text frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] if the text is not JSON, is not an array, or
    /// does not match one of the three known message shapes. Decode failures
    /// are never turned into a `CallError` by this function: the caller (the
    /// Router) does not yet know a `unique_id` to reply against.
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| FrameError::InvalidJson(e.to_string()))?;
        let arr = value.as_array().ok_or(FrameError::NotAnArray)?;
        if arr.is_empty() {
            return Err(FrameError::MissingFields {
                expected: 3,
                got: 0,
            });
        }
        let msg_type = arr
            .first()
            .and_then(Value::as_u64)
            .ok_or(FrameError::InvalidMessageType)?;
        match msg_type {
            MSG_TYPE_CALL => Self::decode_call(arr),
            MSG_TYPE_CALL_RESULT => Self::decode_call_result(arr),
            MSG_TYPE_CALL_ERROR => Self::decode_call_error(arr),
            other => Err(FrameError::UnknownMessageType(other)),
        }
    }

    fn decode_call(arr: &[Value]) -> Result<Self, FrameError> {
        if arr.len() != 4 {
            return Err(FrameError::MissingFields {
                expected: 4,
                got: arr.len(),
            });
        }
        let unique_id = string_field(arr, 1, "uniqueId must be a string")?;
        let action = string_field(arr, 2, "action must be a string")?;
        let payload = arr
            .get(3)
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        Ok(Self::Call {
            unique_id,
            action,
            payload,
        })
    }

    fn decode_call_result(arr: &[Value]) -> Result<Self, FrameError> {
        if arr.len() != 3 {
            return Err(FrameError::MissingFields {
                expected: 3,
                got: arr.len(),
            });
        }
        let unique_id = string_field(arr, 1, "uniqueId must be a string")?;
        let payload = arr
            .get(2)
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        Ok(Self::CallResult { unique_id, payload })
    }

    fn decode_call_error(arr: &[Value]) -> Result<Self, FrameError> {
        if arr.len() != 5 {
            return Err(FrameError::MissingFields {
                expected: 5,
                got: arr.len(),
            });
        }
        let unique_id = string_field(arr, 1, "uniqueId must be a string")?;
        let error_code = string_field(arr, 2, "errorCode must be a string")?;
        let error_description = arr
            .get(3)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let error_details = arr
            .get(4)
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        Ok(Self::CallError {
            unique_id,
            error_code,
            error_description,
            error_details,
        })
    }

    /// Serialize this frame to its wire-format JSON text.
    ///
    /// # Panics
    ///
    /// Never: a [`Frame`] is always built from values that serialize
    /// cleanly, since its fields are either strings or already-valid
    /// [`Value`]s.
    #[must_use]
    pub fn encode(&self) -> String {
        let arr = match self {
            Self::Call {
                unique_id,
                action,
                payload,
            } => Value::Array(vec![
                Value::from(MSG_TYPE_CALL),
                Value::String(unique_id.clone()),
                Value::String(action.clone()),
                payload.clone(),
            ]),
            Self::CallResult { unique_id, payload } => Value::Array(vec![
                Value::from(MSG_TYPE_CALL_RESULT),
                Value::String(unique_id.clone()),
                payload.clone(),
            ]),
            Self::CallError {
                unique_id,
                error_code,
                error_description,
                error_details,
            } => Value::Array(vec![
                Value::from(MSG_TYPE_CALL_ERROR),
                Value::String(unique_id.clone()),
                Value::String(error_code.clone()),
                Value::String(error_description.clone()),
                error_details.clone(),
            ]),
        };
        // `Value::to_string` never fails: every variant above is built from
        // owned strings and values that round-tripped through `decode` or a
        // typed encoder already.
        #[expect(clippy::unwrap_used, reason = "serializing a Value never fails")]
        serde_json::to_string(&arr).unwrap()
    }

    /// The `unique_id` shared by all three frame variants.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        match self {
            Self::Call { unique_id, .. }
            | Self::CallResult { unique_id, .. }
            | Self::CallError { unique_id, .. } => unique_id,
        }
    }

    /// Build the `CallError` reply for a `Call` frame and the cause that
    /// prevented it from being answered normally.
    ///
    /// Only ever called with the originating `Call`'s `unique_id` in hand;
    /// `CallResult`/`CallError` frames never themselves produce a further
    /// `CallError` (there is no retry in OCPP-J).
    #[must_use]
    pub fn error_response(
        unique_id: impl Into<String>,
        error_code: impl Into<String>,
        error_description: impl Into<String>,
    ) -> Self {
        Self::CallError {
            unique_id: unique_id.into(),
            error_code: error_code.into(),
            error_description: error_description.into(),
            error_details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Returns `true` if this is a `Call` frame.
    #[must_use]
    pub const fn is_call(&self) -> bool {
        matches!(self, Self::Call { .. })
    }
}

fn string_field(arr: &[Value], index: usize, what: &'static str) -> Result<String, FrameError> {
    arr.get(index)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or(FrameError::FieldTypeMismatch(what))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn decodes_call() {
        let text = r#"[2,"u1","BootNotification",{"chargingStation":{"model":"Alpha"}}]"#;
        let frame = Frame::decode(text).expect("decode");
        match &frame {
            Frame::Call {
                unique_id, action, ..
            } => {
                assert_eq!(unique_id, "u1");
                assert_eq!(action, "BootNotification");
            }
            _ => panic!("expected Call"),
        }
        assert!(frame.is_call());
    }

    #[rstest]
    fn decodes_call_result() {
        let text = r#"[3,"u1",{"status":"Accepted"}]"#;
        let frame = Frame::decode(text).expect("decode");
        assert_eq!(frame.unique_id(), "u1");
        assert!(matches!(frame, Frame::CallResult { .. }));
    }

    #[rstest]
    fn decodes_call_error() {
        let text = r#"[4,"u2","NotImplemented","unsupported action",{}]"#;
        let frame = Frame::decode(text).expect("decode");
        match &frame {
            Frame::CallError {
                error_code,
                error_description,
                ..
            } => {
                assert_eq!(error_code, "NotImplemented");
                assert_eq!(error_description, "unsupported action");
            }
            _ => panic!("expected CallError"),
        }
    }

    #[rstest]
    #[case("not json")]
    #[case("{}")]
    #[case("[]")]
    #[case("[9,\"u\"]")]
    #[case("[2,\"id\",\"Action\",{},\"extra\"]")]
    #[case("[4,\"id\",\"Code\",\"desc\"]")]
    fn rejects_malformed_frames(#[case] text: &str) {
        assert!(Frame::decode(text).is_err());
    }

    #[rstest]
    fn roundtrips_call() {
        let frame = Frame::Call {
            unique_id: "id1".to_owned(),
            action: "Heartbeat".to_owned(),
            payload: json!({}),
        };
        let text = frame.encode();
        let parsed = Frame::decode(&text).expect("decode");
        assert_eq!(parsed, frame);
    }

    #[rstest]
    fn error_response_carries_originating_id() {
        let err = Frame::error_response("u3", "NotImplemented", "no handler");
        assert_eq!(err.unique_id(), "u3");
    }
}
