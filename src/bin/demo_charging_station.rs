//! `demo-charging-station`: a minimal OCPP-J client exercising scenarios S1
//! (`BootNotification`) and S3 (answering a server-initiated
//! `GetLocalListVersion`) against `ocpp-central-system` (§10 ambient stack).
//!
//! Grounded on the bundled demo's own charging-station client
//! (`examples/charging_station/charging_station.py`): connect, send one
//! `BootNotification`, then sit answering whatever the Central System calls.
//! This binary deliberately has no retry/reconnect logic — it is a fixture
//! for exercising the server, not a production charge-point firmware.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{info, warn};
use uuid::Uuid;

use ocpp_central::codec::{self, Frame};
use ocpp_central::version::Subprotocol;

/// Connect to a Central System and run the boot-and-answer fixture.
#[derive(Parser, Debug)]
struct Args {
    /// Central System WebSocket endpoint, e.g. `ws://127.0.0.1:9000`.
    #[arg(long, default_value = "ws://127.0.0.1:9000")]
    endpoint: String,

    /// Charging station identity, appended to the endpoint path.
    #[arg(long, default_value = "demo-station-1")]
    charging_station_id: String,

    /// Subprotocol to offer; must be one the Central System also installed.
    #[arg(long, default_value = "ocpp2.0.1")]
    subprotocol: String,

    /// How long to keep answering server-initiated calls after booting.
    #[arg(long, default_value_t = 5)]
    listen_secs: u64,
}

fn boot_notification_payload(subprotocol: Subprotocol) -> serde_json::Value {
    match subprotocol {
        Subprotocol::V16 => json!({
            "charge_point_vendor": "Vendor",
            "charge_point_model": "Alpha",
        }),
        Subprotocol::V20 | Subprotocol::V201 => json!({
            "charging_station": {"model": "Alpha", "vendor_name": "Vendor"},
            "reason": "PowerUp",
        }),
    }
}

/// Build the reply a real charging station would give for a server-initiated
/// `GetLocalListVersion`: an empty local list, version zero.
fn get_local_list_version_reply(subprotocol: Subprotocol) -> serde_json::Value {
    match subprotocol {
        Subprotocol::V16 => json!({"list_version": 0}),
        Subprotocol::V20 | Subprotocol::V201 => json!({"version_number": 0}),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let subprotocol = Subprotocol::from_wire_tag(&args.subprotocol)
        .with_context(|| format!("unknown subprotocol {:?}", args.subprotocol))?;

    let url = format!("{}/{}", args.endpoint.trim_end_matches('/'), args.charging_station_id);
    let mut request = url
        .as_str()
        .into_client_request()
        .with_context(|| format!("invalid endpoint url {url:?}"))?;
    request.headers_mut().insert(
        "Sec-WebSocket-Protocol",
        HeaderValue::from_str(subprotocol.wire_tag()).context("subprotocol header")?,
    );

    let (stream, response) = connect_async(request).await.context("websocket connect failed")?;
    info!(status = %response.status(), charging_station_id = %args.charging_station_id, "connected");
    let (mut write, mut read) = stream.split();

    let unique_id = Uuid::new_v4().to_string();
    let boot_call = Frame::Call {
        unique_id: unique_id.clone(),
        action: "BootNotification".to_owned(),
        payload: boot_notification_payload(subprotocol),
    };
    write.send(Message::Text(codec::encode(&boot_call).into())).await.context("send BootNotification")?;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(args.listen_secs);
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        let next = tokio::time::timeout(remaining, read.next()).await;
        let Ok(Some(message)) = next else {
            break;
        };
        let message = message.context("websocket read failed")?;
        let Message::Text(text) = message else {
            continue;
        };
        let frame = match codec::decode(&text) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "dropping undecodable frame");
                continue;
            }
        };

        match frame {
            Frame::CallResult { unique_id: reply_id, payload } if reply_id == unique_id => {
                info!(?payload, "BootNotification accepted");
            }
            Frame::CallError { error_code, error_description, .. } => {
                warn!(error_code, error_description, "Central System returned an error");
            }
            Frame::Call { unique_id: call_id, action, .. } if action == "GetLocalListVersion" => {
                let reply = Frame::CallResult {
                    unique_id: call_id,
                    payload: get_local_list_version_reply(subprotocol),
                };
                write.send(Message::Text(codec::encode(&reply).into())).await.context("send GetLocalListVersion reply")?;
            }
            Frame::Call { unique_id: call_id, action, .. } => {
                warn!(action, "no fixture handler for server-initiated call; ignoring");
                let reply = Frame::error_response(call_id, "NotImplemented", "demo fixture has no handler");
                write.send(Message::Text(codec::encode(&reply).into())).await.context("send NotImplemented")?;
            }
            Frame::CallResult { .. } => {}
        }
    }

    if let Err(err) = write.close().await {
        bail!("failed to close websocket cleanly: {err}");
    }
    Ok(())
}
