//! Per-session context types threaded through the Router (§3).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::correlation::{DEFAULT_RESPONSE_TIMEOUT, PendingCallTable};
use crate::error::OcppError;
use crate::transport::SessionTransport;
use crate::version::Subprotocol;

/// Scope metadata the transport offers for authentication inspection —
/// typically the handshake's HTTP headers. The core never interprets these
/// itself (auth is a Non-goal); it only carries them through to handlers.
pub type Scope = HashMap<String, String>;

/// Session-wide context created on accept, destroyed on disconnect (§3).
///
/// Shared by every inbound frame on this session and by every outbound
/// `call` it originates. Cloning is cheap: the mutable pieces (`call_lock`,
/// the pending-call table) are `Arc`-shared.
#[derive(Clone)]
pub struct RouterContext {
    /// Charging station identifier, taken from the URL path's last segment.
    pub charging_station_id: String,
    /// The subprotocol negotiated for this session.
    pub subprotocol: Subprotocol,
    /// This session's transport handle.
    pub transport: Arc<dyn SessionTransport>,
    /// Binary mutex enforcing at most one in-flight outbound call per session.
    pub call_lock: Arc<Mutex<()>>,
    /// The process-wide Pending-Call Table this session's calls register into.
    pub pending: Arc<PendingCallTable>,
    /// Handshake metadata offered by the transport (e.g. headers).
    pub scope: Scope,
    /// Deadline for an outbound call awaiting its reply.
    pub response_timeout: Duration,
    /// `unique_id` of this session's in-flight outbound call, if any.
    ///
    /// At most one entry at a time (enforced by `call_lock`); the Connection
    /// Coordinator reads this on disconnect to evict the matching Pending-Call
    /// Table entry (§4.F, invariant 5).
    pub outstanding_call: Arc<Mutex<Option<String>>>,
}

impl RouterContext {
    /// Build a new session context with the default `response_timeout`.
    #[must_use]
    pub fn new(
        charging_station_id: impl Into<String>,
        subprotocol: Subprotocol,
        transport: Arc<dyn SessionTransport>,
        pending: Arc<PendingCallTable>,
        scope: Scope,
    ) -> Self {
        Self {
            charging_station_id: charging_station_id.into(),
            subprotocol,
            transport,
            call_lock: Arc::new(Mutex::new(())),
            pending,
            scope,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            outstanding_call: Arc::new(Mutex::new(None)),
        }
    }

    /// Override the default `response_timeout` for this session.
    #[must_use]
    pub const fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }
}

/// A narrow capability closing over the Router and this session's
/// `call_lock`, handed to handlers instead of a back-reference to the Router
/// itself (§9 design note on the cyclic-reference rewrite).
pub type CallCapability = Arc<
    dyn Fn(
            String,
            Value,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Value, OcppError>> + Send>>
        + Send
        + Sync,
>;

/// Passed to every invoked handler and `after` hook (§4.D.2.c).
///
/// Exposes the session identity and an outbound `call` capability; it never
/// holds a reference back to the Router type itself.
#[derive(Clone)]
pub struct HandlerContext {
    /// Charging station identifier for the session this frame arrived on.
    pub charging_station_id: String,
    /// The subprotocol negotiated for this session.
    pub subprotocol: Subprotocol,
    call: CallCapability,
}

impl HandlerContext {
    /// Build a handler context from session identity and a call capability.
    #[must_use]
    pub fn new(
        charging_station_id: impl Into<String>,
        subprotocol: Subprotocol,
        call: CallCapability,
    ) -> Self {
        Self {
            charging_station_id: charging_station_id.into(),
            subprotocol,
            call,
        }
    }

    /// Originate a server-initiated Call for `action` with `request_payload`
    /// and await its matched reply, under this session's `call_lock`.
    ///
    /// # Errors
    ///
    /// Propagates whatever [`crate::router::Router::call`] returns: a
    /// [`crate::error::ErrorKind::Timeout`] if no reply arrives in time, or
    /// the error kind named by a returned `CallError`.
    pub async fn call(&self, action: impl Into<String>, request_payload: Value) -> Result<Value, OcppError> {
        (self.call)(action.into(), request_payload).await
    }
}
