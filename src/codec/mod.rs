//! Protocol Codec: parse and build OCPP-J frames, with lowerCamelCase ⇄
//! snake_case key conversion and per-version schema validation.
//!
//! This is the only module that touches wire text directly; everything
//! downstream of [`decode`] deals in snake_case [`serde_json::Value`]s or the
//! strongly typed shapes in [`crate::version`].

mod casing;
mod frame;
mod validate;

use serde_json::Value;
use thiserror::Error;

pub use casing::{strip_nulls, to_camel_case, to_snake_case};
pub use frame::{Frame, FrameError};
pub use validate::{SchemaViolation, validate_shape};

use crate::error::ErrorKind;

/// Errors raised by the Protocol Codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The wire text could not be decoded into a [`Frame`].
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// The decoded payload failed schema validation.
    #[error("schema violation: {0:?}")]
    Schema(SchemaViolation),
    /// [`make_call_error_from`] was called with a non-`Call` frame.
    #[error("make_call_error_from requires a Call frame")]
    NotACall,
}

/// Decode wire text into a [`Frame`] whose payload keys are snake_case.
///
/// # Errors
///
/// Returns [`CodecError::Frame`] if the text is not a well-formed OCPP-J
/// array. Decode failures must be logged and dropped by the caller, never
/// turned into a fabricated `CallError` (the `unique_id` is not yet known
/// when decoding fails outright).
pub fn decode(text: &str) -> Result<Frame, CodecError> {
    let frame = Frame::decode(text)?;
    Ok(recase_payload(frame, to_snake_case))
}

/// Encode a [`Frame`] whose payload keys are snake_case into wire text,
/// converting keys to lowerCamelCase and stripping absent-valued keys first.
#[must_use]
pub fn encode(frame: &Frame) -> String {
    let camel = recase_payload(frame.clone(), |v| strip_nulls(&to_camel_case(v)));
    camel.encode()
}

fn recase_payload(frame: Frame, convert: impl Fn(&Value) -> Value) -> Frame {
    match frame {
        Frame::Call {
            unique_id,
            action,
            payload,
        } => Frame::Call {
            unique_id,
            action,
            payload: convert(&payload),
        },
        Frame::CallResult { unique_id, payload } => Frame::CallResult {
            unique_id,
            payload: convert(&payload),
        },
        Frame::CallError {
            unique_id,
            error_code,
            error_description,
            error_details,
        } => Frame::CallError {
            unique_id,
            error_code,
            error_description,
            error_details: convert(&error_details),
        },
    }
}

/// Build the `CallError` reply for `call` given the kind and description a
/// handler (or the Router itself) raised.
///
/// # Errors
///
/// Returns [`CodecError::NotACall`] if `call` is not a `Call` frame: a
/// `CallResult`/`CallError` never itself produces a further `CallError`,
/// since OCPP-J has no retry.
pub fn make_call_error_from(
    call: &Frame,
    kind: &ErrorKind,
    description: impl Into<String>,
) -> Result<Frame, CodecError> {
    if !call.is_call() {
        return Err(CodecError::NotACall);
    }
    let code = kind.wire_code().unwrap_or("GenericError");
    Ok(Frame::error_response(
        call.unique_id().to_owned(),
        code,
        description.into(),
    ))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn decode_converts_payload_to_snake_case() {
        let text = r#"[2,"u1","BootNotification",{"chargingStation":{"vendorName":"Acme"}}]"#;
        let frame = decode(text).expect("decode");
        let Frame::Call { payload, .. } = &frame else {
            panic!("expected Call");
        };
        assert_eq!(
            payload,
            &json!({"charging_station": {"vendor_name": "Acme"}})
        );
    }

    #[rstest]
    fn encode_converts_payload_to_camel_case_and_strips_nulls() {
        let frame = Frame::CallResult {
            unique_id: "u1".to_owned(),
            payload: json!({"current_time": "now", "interval": 10, "charging_profile": null}),
        };
        let text = encode(&frame);
        assert!(text.contains("currentTime"));
        assert!(text.contains("interval"));
        assert!(!text.contains("chargingProfile"));
    }

    #[rstest]
    fn roundtrips_through_decode_and_encode() {
        let original = r#"[2,"u1","Heartbeat",{}]"#;
        let frame = decode(original).expect("decode");
        let text = encode(&frame);
        let reparsed = decode(&text).expect("decode again");
        assert_eq!(frame, reparsed);
    }

    #[rstest]
    fn make_call_error_from_requires_a_call_frame() {
        let reply = Frame::CallResult {
            unique_id: "u1".to_owned(),
            payload: json!({}),
        };
        let err = make_call_error_from(&reply, &ErrorKind::InternalError, "boom")
            .expect_err("not a call");
        assert_eq!(err, CodecError::NotACall);
    }

    #[rstest]
    fn make_call_error_from_uses_originating_id_and_wire_code() {
        let call = Frame::Call {
            unique_id: "u7".to_owned(),
            action: "Fictional".to_owned(),
            payload: json!({}),
        };
        let error = make_call_error_from(&call, &ErrorKind::NotImplemented, "no handler")
            .expect("build error");
        let Frame::CallError {
            unique_id,
            error_code,
            ..
        } = &error
        else {
            panic!("expected CallError");
        };
        assert_eq!(unique_id, "u7");
        assert_eq!(error_code, "NotImplemented");
    }
}
