//! WebSocket Transport Adapter variant (§4.C): one long-lived, per-session
//! text-frame connection accepted via axum's `ws` extractor.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt, stream};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{SessionTransport, TransportError};
use crate::connection::{self, DisconnectReason, FrameEvent};
use crate::router::Scope;
use crate::shell::ApplicationShell;
use crate::version::Subprotocol;

/// Forwards frames queued by [`crate::router::Router::send`]-family calls to
/// the live socket's write half, which runs on its own task (see
/// [`handle_socket`]) so a slow reader never blocks an outbound `call`.
pub struct WebSocketTransport {
    outbound: mpsc::UnboundedSender<Message>,
}

#[async_trait]
impl SessionTransport for WebSocketTransport {
    async fn send(&self, text: String, _is_response: bool) -> Result<(), TransportError> {
        self.outbound
            .send(Message::Text(text.into()))
            .map_err(|_send_error| TransportError::ConnectionClosed)
    }
}

/// `GET /{charging_station_id}`: negotiate a subprotocol from
/// `Sec-WebSocket-Protocol` and upgrade, or reject with `400` if the
/// offered set shares nothing with the installed routers.
pub async fn upgrade_handler(
    Path(charging_station_id): Path<String>,
    headers: HeaderMap,
    State(shell): State<Arc<ApplicationShell>>,
    ws: WebSocketUpgrade,
) -> Response {
    let offered = offered_subprotocols(&headers);
    let Some(subprotocol) = shell.negotiate(&offered) else {
        warn!(charging_station_id, ?offered, "no shared subprotocol; rejecting session");
        return (StatusCode::BAD_REQUEST, "no shared OCPP subprotocol").into_response();
    };

    let scope: Scope = headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_owned())))
        .collect();

    ws.protocols([subprotocol.wire_tag()])
        .on_upgrade(move |socket| handle_socket(socket, shell, charging_station_id, subprotocol, scope))
}

fn offered_subprotocols(headers: &HeaderMap) -> Vec<String> {
    headers
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(',').map(|tag| tag.trim().to_owned()).collect())
        .unwrap_or_default()
}

async fn handle_socket(
    socket: WebSocket,
    shell: Arc<ApplicationShell>,
    charging_station_id: String,
    subprotocol: Subprotocol,
    scope: Scope,
) {
    let (mut sink, stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    let transport: Arc<dyn SessionTransport> = Arc::new(WebSocketTransport { outbound: outbound_tx });

    let Some((router, ctx)) = shell
        .accept(charging_station_id.clone(), subprotocol, transport, scope)
        .await
    else {
        writer.abort();
        return;
    };

    let frames = stream::unfold(stream, |mut stream| async move {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => Some((FrameEvent::Text(text.to_string()), stream)),
            Some(Ok(Message::Close(frame))) => {
                let code = frame.map_or(1000, |close_frame| close_frame.code);
                Some((FrameEvent::Close(code), stream))
            }
            Some(Ok(_binary_or_ping_pong)) | Some(Err(_)) | None => None,
        }
    });

    let reason = connection::run_inbound_pump(router, ctx, frames).await;
    writer.abort();
    shell.on_disconnect(charging_station_id, subprotocol, close_code(reason)).await;
    info!("session closed");
}

fn close_code(reason: DisconnectReason) -> u16 {
    match reason {
        DisconnectReason::Closed(code) => code,
        DisconnectReason::StreamEnded => 1006,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn offered_subprotocols_splits_and_trims() {
        let mut headers = HeaderMap::new();
        headers.insert(header::SEC_WEBSOCKET_PROTOCOL, "ocpp2.0.1, ocpp1.6".parse().expect("header value"));
        assert_eq!(offered_subprotocols(&headers), vec!["ocpp2.0.1", "ocpp1.6"]);
    }

    #[rstest]
    fn offered_subprotocols_empty_without_header() {
        let headers = HeaderMap::new();
        assert!(offered_subprotocols(&headers).is_empty());
    }

    #[rstest]
    fn close_code_falls_back_for_stream_ended() {
        assert_eq!(close_code(DisconnectReason::StreamEnded), 1006);
        assert_eq!(close_code(DisconnectReason::Closed(1000)), 1000);
    }
}
