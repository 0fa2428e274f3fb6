//! Transport Adapter (§4.C): the WebSocket and HTTP-tunneled variants share a
//! single contract so the Router, Correlation Engine, and Connection
//! Coordinator never need to know which one they are talking to.

pub mod http_tunnel;
pub mod websocket;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a transport adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The underlying connection is gone (closed socket, torn-down session).
    #[error("transport connection closed")]
    ConnectionClosed,
    /// The HTTP-tunneled variant received an envelope it could not parse.
    #[error("malformed tunnel envelope: {0}")]
    MalformedEnvelope(String),
    /// The server-originated-send side channel is unavailable (HTTP variant
    /// only; the WebSocket variant never needs a side channel).
    #[error("side channel unavailable")]
    SideChannelUnavailable,
}

/// A handle to one accepted session's outbound path.
///
/// `send` is the uniform primitive both transport variants implement:
/// `is_response` is meaningful only to the HTTP-tunneled variant, which must
/// distinguish "reply inside this HTTP response" from "new server-initiated
/// Call, route through the side channel" (§4.C).
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Send one OCPP-J wire-text frame on this session.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionClosed`] if the session is gone,
    /// or [`TransportError::SideChannelUnavailable`] if `is_response` is
    /// `false` on the HTTP variant and no side channel is configured.
    async fn send(&self, text: String, is_response: bool) -> Result<(), TransportError>;
}

/// Lifecycle events a transport variant surfaces to the Application Shell.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// The host process is starting up.
    Startup,
    /// The host process is shutting down.
    Shutdown,
    /// A new session's handshake metadata, before accept/reject.
    SessionOpen {
        /// Identifier of the charging station, from the URL path.
        charging_station_id: String,
        /// Subprotocols offered by the client.
        offered_subprotocols: Vec<String>,
    },
    /// One inbound OCPP-J wire-text frame.
    Frame(String),
    /// The session closed, with the transport-reported close code.
    SessionClose(u16),
}
