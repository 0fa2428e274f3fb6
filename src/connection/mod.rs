//! Connection Coordinator (§4.F): drives one accepted session's inbound
//! pump and cleans up its share of the Pending-Call Table on disconnect.
//!
//! The per-session `call_lock` and `outstanding_call` bookkeeping live on
//! [`RouterContext`] itself (shared with [`crate::router::Router::call`]);
//! this module only owns the pump loop and the teardown it triggers.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tracing::{info, warn};

use crate::router::{Router, RouterContext};

/// One event the transport's inbound stream can yield for a session.
#[derive(Debug, Clone)]
pub enum FrameEvent {
    /// A decoded OCPP-J wire-text frame arrived.
    Text(String),
    /// The transport closed, with its reported close code.
    Close(u16),
}

/// Why [`run_inbound_pump`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The transport reported this WebSocket close code.
    Closed(u16),
    /// The frame stream ended without an explicit close event.
    StreamEnded,
}

/// Drain `frames` in arrival order, handing each to `router.route_message`.
///
/// Awaiting each frame's routing before polling the next is what gives §5's
/// per-session ordering guarantee: a slow handler backpressures the
/// underlying socket rather than letting frames reorder.
///
/// On return, this session's outstanding outbound call (if any) is evicted
/// from the Pending-Call Table, which resolves the caller's `await_reply`
/// with [`crate::correlation::CorrelationError::ConnectionClosed`]
/// (invariant 5, §8).
pub async fn run_inbound_pump<S>(router: Arc<Router>, ctx: RouterContext, mut frames: S) -> DisconnectReason
where
    S: Stream<Item = FrameEvent> + Unpin,
{
    let mut reason = DisconnectReason::StreamEnded;
    while let Some(event) = frames.next().await {
        match event {
            FrameEvent::Text(text) => {
                Arc::clone(&router).route_message(&text, &ctx).await;
            }
            FrameEvent::Close(code) => {
                reason = DisconnectReason::Closed(code);
                break;
            }
        }
    }
    teardown(&ctx).await;
    info!(
        charging_station_id = %ctx.charging_station_id,
        ?reason,
        "session pump stopped"
    );
    reason
}

/// Cancel this session's in-flight outbound call, if any (§4.F teardown).
async fn teardown(ctx: &RouterContext) {
    if let Some(unique_id) = ctx.outstanding_call.lock().await.take() {
        warn!(unique_id, "evicting in-flight outbound call on disconnect");
        ctx.pending.remove(&unique_id);
    }
}
