//! Error taxonomy for the OCPP-J Central System runtime.
//!
//! Each component exposes its own narrow error enum; [`OcppError`] composes
//! them into the single `Err` arm returned by the crate's public, cross-cutting
//! entry points. The taxonomy also doubles as the mapping to on-wire OCPP-J
//! `errorCode` strings (§7 of the design): [`ErrorKind::wire_code`] is the only
//! place that mapping is allowed to live.

use thiserror::Error;

use crate::codec::CodecError;
use crate::correlation::CorrelationError;
use crate::transport::TransportError;

/// Taxonomy of failures that can be reported back to a Charging Station as a
/// `CallError`, or raised locally for outbound calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No handler is registered for the routed action.
    #[error("no handler registered for this action")]
    NotImplemented,
    /// The action is known but not permitted on this path.
    #[error("action not supported on this connection")]
    NotSupported,
    /// A handler raised an unexpected failure.
    #[error("internal error")]
    InternalError,
    /// The frame's shape was invalid (wrong arity or message-type tag).
    #[error("protocol error")]
    ProtocolError,
    /// A handler rejected the request on authentication/authorization grounds.
    #[error("security error")]
    SecurityError,
    /// The payload was valid JSON but failed schema validation.
    #[error("formation violation")]
    FormationViolation,
    /// A schema property rule failed.
    #[error("property constraint violation")]
    PropertyConstraintViolation,
    /// A schema cardinality rule failed.
    #[error("occurrence constraint violation")]
    OccurrenceConstraintViolation,
    /// A schema type rule failed.
    #[error("type constraint violation")]
    TypeConstraintViolation,
    /// Catch-all for failures that do not fit a more specific kind.
    #[error("generic error")]
    GenericError,
    /// An outbound call's reply did not arrive before `response_timeout`.
    ///
    /// Never surfaced on the wire; raised locally to the caller of `call`.
    #[error("outbound call timed out")]
    Timeout,
}

impl ErrorKind {
    /// The OCPP-J `errorCode` string this kind is surfaced as in a CallError.
    ///
    /// [`ErrorKind::Timeout`] has no wire representation: it is only ever
    /// raised locally to the caller of an outbound `call`.
    #[must_use]
    pub const fn wire_code(&self) -> Option<&'static str> {
        match self {
            Self::NotImplemented => Some("NotImplemented"),
            Self::NotSupported => Some("NotSupported"),
            Self::InternalError => Some("InternalError"),
            Self::ProtocolError => Some("ProtocolError"),
            Self::SecurityError => Some("SecurityError"),
            Self::FormationViolation => Some("FormationViolation"),
            Self::PropertyConstraintViolation => Some("PropertyConstraintViolation"),
            Self::OccurrenceConstraintViolation => Some("OccurrenceConstraintViolation"),
            Self::TypeConstraintViolation => Some("TypeConstraintViolation"),
            Self::GenericError => Some("GenericError"),
            Self::Timeout => None,
        }
    }

    /// Recover a kind from an on-wire `errorCode` string, for translating an
    /// inbound `CallError` back into a local failure in [`crate::router::Router::call`].
    ///
    /// Unrecognised codes map to [`ErrorKind::GenericError`] rather than
    /// failing outright, since the far end may speak a newer profile.
    #[must_use]
    pub fn from_wire_code(code: &str) -> Self {
        match code {
            "NotImplemented" => Self::NotImplemented,
            "NotSupported" => Self::NotSupported,
            "InternalError" => Self::InternalError,
            "ProtocolError" => Self::ProtocolError,
            "SecurityError" => Self::SecurityError,
            "FormationViolation" => Self::FormationViolation,
            "PropertyConstraintViolation" => Self::PropertyConstraintViolation,
            "OccurrenceConstraintViolation" => Self::OccurrenceConstraintViolation,
            "TypeConstraintViolation" => Self::TypeConstraintViolation,
            _ => Self::GenericError,
        }
    }
}

/// A handler-raised domain failure, carrying the taxonomy kind plus a
/// human-readable description surfaced verbatim in the CallError.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}: {description}")]
pub struct HandlerError {
    /// The taxonomy kind this failure maps to on the wire.
    pub kind: ErrorKind,
    /// Free-form description included in the CallError's `errorDescription`.
    pub description: String,
}

impl HandlerError {
    /// Build a handler error from a kind and description.
    pub fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }
}

/// Top-level error type for the crate's cross-cutting public functions.
///
/// Component-scoped errors ([`CodecError`], [`CorrelationError`],
/// [`TransportError`]) are returned directly by functions that belong to a
/// single component; `OcppError` is for call sites that cross component
/// boundaries (the Router, the Application Shell).
#[derive(Debug, Error)]
pub enum OcppError {
    /// A handler raised a domain-level failure.
    #[error(transparent)]
    Handler(#[from] HandlerError),
    /// Frame decoding, encoding, or schema validation failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The correlation engine could not complete an outbound call.
    #[error(transparent)]
    Correlation(#[from] CorrelationError),
    /// The transport adapter failed to deliver or receive a frame.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Configuration was invalid at startup.
    #[error("configuration error: {0}")]
    Config(String),
}

impl OcppError {
    /// The taxonomy kind this error maps to when it must be encoded as a
    /// CallError, falling back to [`ErrorKind::GenericError`] for failures
    /// that are not themselves a [`HandlerError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Handler(e) => e.kind.clone(),
            Self::Codec(_) => ErrorKind::FormationViolation,
            Self::Correlation(CorrelationError::Timeout { .. }) => ErrorKind::Timeout,
            Self::Correlation(_) | Self::Transport(_) | Self::Config(_) => {
                ErrorKind::InternalError
            }
        }
    }
}
