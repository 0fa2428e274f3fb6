//! Default action handlers wiring the representative action set (§4.B) into
//! a [`Router`] for each subprotocol.
//!
//! Grounded directly on the bundled example routers this spec was distilled
//! from (`examples/central_system/routers/v16/provisioning_router.py` and
//! `.../v201/provisioning_router.py`): `BootNotification` accepts and its
//! `after` hook immediately issues a `GetLocalListVersion` call, reproducing
//! scenarios S1 and S3 end to end. A host is free to call [`Router::on`]
//! again to override any of these before accepting sessions.

use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

use crate::error::OcppError;
use crate::router::{HandlerContext, Router};

fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}

/// Register the representative handler set into a `ocpp1.6` [`Router`].
pub fn register_v16(router: &mut Router) {
    router.on("BootNotification", false, |payload, ctx| async move {
        info!(
            charging_station_id = %ctx.charging_station_id,
            ?payload,
            "BootNotification"
        );
        Ok(json!({
            "status": "Accepted",
            "current_time": now_iso8601(),
            "interval": 10,
        }))
    });
    router.after("BootNotification", after_boot_notification);

    router.on("Heartbeat", false, |_payload, _ctx| async move {
        Ok(json!({"current_time": now_iso8601()}))
    });

    router.on("Authorize", false, |_payload, _ctx| async move {
        Ok(json!({"id_tag_info": {"status": "Accepted"}}))
    });

    router.on("StatusNotification", false, |_payload, _ctx| async move { Ok(json!({})) });

    router.on("DataTransfer", false, |_payload, _ctx| async move {
        Ok(json!({"status": "Accepted"}))
    });
}

/// Register the representative handler set into an `ocpp2.0`/`ocpp2.0.1`
/// [`Router`]. The request/response shapes differ from v16's (nested
/// `charging_station`/`id_token` objects), but the handler behaviour mirrors
/// it exactly.
pub fn register_v201(router: &mut Router) {
    router.on("BootNotification", false, |payload, ctx| async move {
        info!(
            charging_station_id = %ctx.charging_station_id,
            ?payload,
            "BootNotification"
        );
        Ok(json!({
            "current_time": now_iso8601(),
            "interval": 10,
            "status": "Accepted",
        }))
    });
    router.after("BootNotification", after_boot_notification);

    router.on("Heartbeat", false, |_payload, _ctx| async move {
        Ok(json!({"current_time": now_iso8601()}))
    });

    router.on("Authorize", false, |_payload, _ctx| async move {
        Ok(json!({"id_token_info": {"status": "Accepted"}}))
    });

    router.on("StatusNotification", false, |_payload, _ctx| async move { Ok(json!({})) });

    router.on("DataTransfer", false, |_payload, _ctx| async move {
        Ok(json!({"status": "Accepted"}))
    });
}

/// Shared `after(BootNotification)` hook (S3): immediately issues a
/// server-initiated `GetLocalListVersion` call and logs its reply. Failures
/// (including `Timeout`, S4) are logged and otherwise ignored — an `after`
/// hook's return value is never observed by the response path (§4.D.2.e).
async fn after_boot_notification(_payload: Value, ctx: HandlerContext) -> Result<Value, OcppError> {
    let response = ctx.call("GetLocalListVersion", json!({})).await?;
    info!(
        charging_station_id = %ctx.charging_station_id,
        ?response,
        "GetLocalListVersion completed after BootNotification"
    );
    Ok(Value::Null)
}
