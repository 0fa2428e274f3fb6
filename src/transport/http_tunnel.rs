//! HTTP-tunneled Transport Adapter variant (§4.C, §6): each inbound HTTP
//! request carries exactly one OCPP-J frame in its body, for serverless /
//! split-plane deployments where the socket itself is held by an
//! out-of-process WebSocket Proxy.
//!
//! A "session" here spans many stateless HTTP invocations rather than one
//! long-lived connection. To still honour §3's per-session `call_lock` and
//! Pending-Call Table sharing, [`HttpTunnelRegistry`] keeps one
//! [`RouterContext`] per `connection_id` alive across requests — only its
//! `transport` field is swapped out on every request, since that member
//! alone carries this particular HTTP call's reply slot.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::warn;

use super::{SessionTransport, TransportError};
use crate::router::{Router, RouterContext, Scope};
use crate::shell::ApplicationShell;

/// Publishes a server-initiated frame to whichever WebSocket Proxy instance
/// holds `connection_id`'s live socket (§6: "server-originated send over
/// HTTP"). [`crate::sidechannel::RedisSideChannel`] is the bundled
/// implementation; hosts may supply their own.
#[async_trait]
pub trait HttpSideChannel: Send + Sync {
    /// Deliver `text` to `connection_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the side channel could not be reached.
    async fn send(&self, connection_id: &str, text: &str) -> Result<(), TransportError>;
}

/// `{ "requestContext": { "connection_id": ..., "subprotocols": [...] }, "body": "..." }`
/// (§6). Field names inside `requestContext` are carried verbatim from the
/// envelope, not lowerCamelCase-converted: the envelope is host plumbing, not
/// an OCPP payload, so §4.A's casing rule does not apply to it.
#[derive(Debug, Deserialize)]
struct TunnelEnvelope {
    #[serde(rename = "requestContext")]
    request_context: RequestContext,
    body: String,
}

#[derive(Debug, Deserialize)]
struct RequestContext {
    connection_id: String,
    #[serde(default)]
    subprotocols: Vec<String>,
}

/// Handed to the Router in place of a live socket. `send` with
/// `is_response=true` captures the reply for this HTTP response's body;
/// `is_response=false` (a server-initiated Call) is forwarded to the
/// configured [`HttpSideChannel`], since there is no response body left to
/// carry it (§4.C).
struct HttpTunnelTransport {
    connection_id: String,
    side_channel: Option<Arc<dyn HttpSideChannel>>,
    reply: Mutex<Option<String>>,
}

impl HttpTunnelTransport {
    fn new(connection_id: String, side_channel: Option<Arc<dyn HttpSideChannel>>) -> Self {
        Self {
            connection_id,
            side_channel,
            reply: Mutex::new(None),
        }
    }

    async fn take_reply(&self) -> Option<String> {
        self.reply.lock().await.take()
    }
}

#[async_trait]
impl SessionTransport for HttpTunnelTransport {
    async fn send(&self, text: String, is_response: bool) -> Result<(), TransportError> {
        if is_response {
            *self.reply.lock().await = Some(text);
            return Ok(());
        }
        match &self.side_channel {
            Some(channel) => channel.send(&self.connection_id, &text).await,
            None => Err(TransportError::SideChannelUnavailable),
        }
    }
}

/// Keeps one [`RouterContext`] alive per `connection_id` across otherwise
/// stateless HTTP invocations, so `call_lock` and the Pending-Call Table
/// entry still belong to one logical session rather than one request.
///
/// Each slot is its own `tokio::sync::Mutex`, obtained through `DashMap`'s
/// synchronous `entry` API so the shard lock is never held across the
/// `negotiate`+`accept` await below: two concurrent requests for the same
/// *new* `connection_id` fetch (or create) the same slot mutex, then
/// serialize through it, so only one ever runs `accept` and the other
/// observes the slot already filled in.
#[derive(Default)]
struct HttpTunnelRegistry {
    sessions: DashMap<String, Arc<Mutex<Option<(Arc<Router>, RouterContext)>>>>,
}

impl HttpTunnelRegistry {
    /// Look up this `connection_id`'s session, negotiating and running
    /// `on_connect` only on its first-ever request.
    async fn get_or_create(
        &self,
        shell: &ApplicationShell,
        connection_id: &str,
        subprotocols: &[String],
    ) -> Option<(Arc<Router>, RouterContext)> {
        let slot = {
            let entry = self
                .sessions
                .entry(connection_id.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(None)));
            Arc::clone(&entry)
        };
        let mut guard = slot.lock().await;
        if let Some(session) = guard.as_ref() {
            return Some(session.clone());
        }
        let subprotocol = shell.negotiate(subprotocols)?;
        let placeholder: Arc<dyn SessionTransport> =
            Arc::new(HttpTunnelTransport::new(connection_id.to_owned(), None));
        let (router, ctx) = shell
            .accept(connection_id, subprotocol, placeholder, Scope::new())
            .await?;
        let session = (router, ctx);
        *guard = Some(session.clone());
        Some(session)
    }
}

/// Shared state for the HTTP-tunneled ingress (§4.C, §6).
pub struct HttpTunnelState {
    shell: Arc<ApplicationShell>,
    registry: HttpTunnelRegistry,
    side_channel: Option<Arc<dyn HttpSideChannel>>,
}

impl HttpTunnelState {
    /// Build tunnel state for `shell`, optionally wiring a side channel for
    /// server-initiated Calls.
    #[must_use]
    pub fn new(shell: Arc<ApplicationShell>, side_channel: Option<Arc<dyn HttpSideChannel>>) -> Self {
        Self {
            shell,
            registry: HttpTunnelRegistry::default(),
            side_channel,
        }
    }
}

/// `POST` handler for one tunneled OCPP-J frame (§6).
///
/// Returns `400` for a malformed envelope or a disjoint subprotocol offer;
/// otherwise `200` with the CallResult/CallError body for an inbound Call,
/// or an empty `200` for an inbound CallResult/CallError (which carries no
/// reply of its own).
pub async fn tunnel_handler(State(state): State<Arc<HttpTunnelState>>, body: Bytes) -> Response {
    let envelope: TunnelEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "malformed tunnel envelope");
            return (StatusCode::BAD_REQUEST, format!("malformed tunnel envelope: {err}")).into_response();
        }
    };

    let connection_id = envelope.request_context.connection_id;
    let Some((router, mut ctx)) = state
        .registry
        .get_or_create(&state.shell, &connection_id, &envelope.request_context.subprotocols)
        .await
    else {
        warn!(connection_id, "no shared subprotocol; rejecting tunneled frame");
        return (StatusCode::BAD_REQUEST, "no shared OCPP subprotocol").into_response();
    };

    let transport = Arc::new(HttpTunnelTransport::new(connection_id, state.side_channel.clone()));
    ctx.transport = Arc::clone(&transport) as Arc<dyn SessionTransport>;

    router.route_message(&envelope.body, &ctx).await;

    match transport.take_reply().await {
        Some(reply) => (StatusCode::OK, reply).into_response(),
        None => StatusCode::OK.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::version::{Subprotocol, VersionAdapter};

    fn state_with(subprotocol: Subprotocol) -> Arc<HttpTunnelState> {
        let mut routers = std::collections::HashMap::new();
        routers.insert(subprotocol, Arc::new(Router::new(subprotocol, Arc::new(VersionAdapter::new(subprotocol)))));
        Arc::new(HttpTunnelState::new(Arc::new(ApplicationShell::new(routers)), None))
    }

    #[rstest]
    #[tokio::test]
    async fn rejects_malformed_envelope_with_400() {
        let state = state_with(Subprotocol::V16);
        let response = tunnel_handler(State(state), Bytes::from_static(b"not json")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[tokio::test]
    async fn rejects_disjoint_subprotocol_offer_with_400() {
        let state = state_with(Subprotocol::V201);
        let envelope = json!({
            "requestContext": {"connection_id": "cs-1", "subprotocols": ["ocpp1.6"]},
            "body": "[2,\"u1\",\"Heartbeat\",{}]",
        });
        let response = tunnel_handler(State(state), Bytes::from(envelope.to_string())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_action_returns_not_implemented_call_error() {
        let state = state_with(Subprotocol::V16);
        let envelope = json!({
            "requestContext": {"connection_id": "cs-1", "subprotocols": ["ocpp1.6"]},
            "body": "[2,\"u1\",\"Fictional\",{}]",
        });
        let response = tunnel_handler(State(state), Bytes::from(envelope.to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let text = String::from_utf8(bytes.to_vec()).expect("utf8");
        assert!(text.contains("NotImplemented"));
    }

    #[rstest]
    #[tokio::test]
    async fn reply_inbound_frame_returns_empty_200() {
        let state = state_with(Subprotocol::V16);
        let envelope = json!({
            "requestContext": {"connection_id": "cs-1", "subprotocols": ["ocpp1.6"]},
            "body": "[3,\"unknown-id\",{}]",
        });
        let response = tunnel_handler(State(state), Bytes::from(envelope.to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert!(bytes.is_empty());
    }
}
