//! Concrete request/response shapes for the representative action set named
//! in §4.B, per subprotocol.
//!
//! `ocpp2.0` and `ocpp2.0.1` share the same representative shapes here: the
//! two versions' payloads for this action set did not diverge enough to
//! justify duplicate types, so `v20` registers the `v201` shapes under its
//! own adapter. A host adding further `ocpp2.0`-specific actions is free to
//! register genuinely distinct shapes for them.

use serde::{Deserialize, Serialize};

use super::{Direction, Subprotocol, VersionAdapter};

/// Register the representative action set's shapes into `adapter` for
/// `subprotocol`.
pub fn register_defaults(adapter: &mut VersionAdapter, subprotocol: Subprotocol) {
    match subprotocol {
        Subprotocol::V16 => v16::register(adapter),
        Subprotocol::V20 | Subprotocol::V201 => v201::register(adapter),
    }
}

/// `ocpp1.6` payload shapes.
pub mod v16 {
    use super::{Deserialize, Direction, Serialize, VersionAdapter};

    /// `BootNotification.req` (OCPP 1.6).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct BootNotificationRequest {
        /// Vendor of the charge point.
        pub charge_point_vendor: String,
        /// Model identifier of the charge point.
        pub charge_point_model: String,
        /// Serial number of the charge point, if reported.
        #[serde(default)]
        pub charge_point_serial_number: Option<String>,
        /// Firmware version, if reported.
        #[serde(default)]
        pub firmware_version: Option<String>,
    }

    /// `BootNotification.conf` (OCPP 1.6).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct BootNotificationResponse {
        /// Registration outcome: `Accepted`, `Pending`, or `Rejected`.
        pub status: String,
        /// Central System's current time, ISO-8601.
        pub current_time: String,
        /// Suggested heartbeat interval, in seconds.
        pub interval: u32,
    }

    /// `Heartbeat.req` (OCPP 1.6) — carries no fields.
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    pub struct HeartbeatRequest {}

    /// `Heartbeat.conf` (OCPP 1.6).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct HeartbeatResponse {
        /// Central System's current time, ISO-8601.
        pub current_time: String,
    }

    /// `Authorize.req` (OCPP 1.6).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct AuthorizeRequest {
        /// RFID tag presented by the driver.
        pub id_tag: String,
    }

    /// `Authorize.conf` (OCPP 1.6).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct AuthorizeResponse {
        /// Authorization outcome for `id_tag`.
        pub id_tag_info: IdTagInfo,
    }

    /// Nested authorization status used by `Authorize.conf`.
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct IdTagInfo {
        /// `Accepted`, `Blocked`, `Expired`, or `Invalid`.
        pub status: String,
    }

    /// `StatusNotification.req` (OCPP 1.6).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct StatusNotificationRequest {
        /// Connector reporting the status change, `0` for the charge point itself.
        pub connector_id: i32,
        /// OCPP error code reported alongside the status.
        pub error_code: String,
        /// New connector status.
        pub status: String,
        /// Timestamp the status change was observed, if reported.
        #[serde(default)]
        pub timestamp: Option<String>,
    }

    /// `StatusNotification.conf` (OCPP 1.6) — carries no fields.
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    pub struct StatusNotificationResponse {}

    /// `GetLocalListVersion.req` (OCPP 1.6) — carries no fields.
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    pub struct GetLocalListVersionRequest {}

    /// `GetLocalListVersion.conf` (OCPP 1.6).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct GetLocalListVersionResponse {
        /// Current version of the local authorization list; `0` means empty.
        pub list_version: i32,
    }

    /// `DataTransfer.req` (OCPP 1.6).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct DataTransferRequest {
        /// Vendor identifier for the custom payload.
        pub vendor_id: String,
        /// Vendor-defined message identifier, if any.
        #[serde(default)]
        pub message_id: Option<String>,
        /// Opaque vendor payload, if any.
        #[serde(default)]
        pub data: Option<String>,
    }

    /// `DataTransfer.conf` (OCPP 1.6).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct DataTransferResponse {
        /// `Accepted`, `Rejected`, `UnknownMessageId`, or `UnknownVendorId`.
        pub status: String,
        /// Opaque vendor reply payload, if any.
        #[serde(default)]
        pub data: Option<String>,
    }

    pub(super) fn register(adapter: &mut VersionAdapter) {
        adapter
            .register::<BootNotificationRequest>("BootNotification", Direction::Request)
            .register::<BootNotificationResponse>("BootNotification", Direction::Response)
            .register::<HeartbeatRequest>("Heartbeat", Direction::Request)
            .register::<HeartbeatResponse>("Heartbeat", Direction::Response)
            .register::<AuthorizeRequest>("Authorize", Direction::Request)
            .register::<AuthorizeResponse>("Authorize", Direction::Response)
            .register::<StatusNotificationRequest>("StatusNotification", Direction::Request)
            .register::<StatusNotificationResponse>("StatusNotification", Direction::Response)
            .register::<GetLocalListVersionRequest>("GetLocalListVersion", Direction::Request)
            .register::<GetLocalListVersionResponse>("GetLocalListVersion", Direction::Response)
            .register::<DataTransferRequest>("DataTransfer", Direction::Request)
            .register::<DataTransferResponse>("DataTransfer", Direction::Response);
    }
}

/// `ocpp2.0` / `ocpp2.0.1` payload shapes.
pub mod v201 {
    use super::{Deserialize, Direction, Serialize, VersionAdapter};

    /// Identifies the charging station in `BootNotification.req` (OCPP 2.0.1).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct ChargingStation {
        /// Model identifier of the charging station.
        pub model: String,
        /// Vendor name of the charging station.
        pub vendor_name: String,
        /// Serial number, if reported.
        #[serde(default)]
        pub serial_number: Option<String>,
        /// Firmware version, if reported.
        #[serde(default)]
        pub firmware_version: Option<String>,
    }

    /// `BootNotification.req` (OCPP 2.0.1).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct BootNotificationRequest {
        /// Identity of the booting charging station.
        pub charging_station: ChargingStation,
        /// Reason the charging station (re)booted.
        pub reason: String,
    }

    /// `BootNotification.conf` (OCPP 2.0.1).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct BootNotificationResponse {
        /// Central System's current time, ISO-8601.
        pub current_time: String,
        /// Suggested heartbeat interval, in seconds.
        pub interval: u32,
        /// Registration outcome: `Accepted`, `Pending`, or `Rejected`.
        pub status: String,
    }

    /// `Heartbeat.req` (OCPP 2.0.1) — carries no fields.
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    pub struct HeartbeatRequest {}

    /// `Heartbeat.conf` (OCPP 2.0.1).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct HeartbeatResponse {
        /// Central System's current time, ISO-8601.
        pub current_time: String,
    }

    /// Identity token presented in `Authorize.req` (OCPP 2.0.1).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct IdToken {
        /// The token's value.
        pub id_token: String,
        /// The token's type, e.g. `ISO14443`.
        #[serde(rename = "type")]
        pub token_type: String,
    }

    /// `Authorize.req` (OCPP 2.0.1).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct AuthorizeRequest {
        /// Identity token presented by the driver.
        pub id_token: IdToken,
    }

    /// Nested authorization status used by `Authorize.conf`.
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct IdTokenInfo {
        /// `Accepted`, `Blocked`, `Expired`, or `Invalid`.
        pub status: String,
    }

    /// `Authorize.conf` (OCPP 2.0.1).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct AuthorizeResponse {
        /// Authorization outcome for the presented token.
        pub id_token_info: IdTokenInfo,
    }

    /// `StatusNotification.req` (OCPP 2.0.1).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct StatusNotificationRequest {
        /// Timestamp the status change was observed.
        pub timestamp: String,
        /// New connector status.
        pub connector_status: String,
        /// EVSE reporting the status change.
        pub evse_id: i32,
        /// Connector reporting the status change.
        pub connector_id: i32,
    }

    /// `StatusNotification.conf` (OCPP 2.0.1) — carries no fields.
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    pub struct StatusNotificationResponse {}

    /// `GetLocalListVersion.req` (OCPP 2.0.1) — carries no fields.
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    pub struct GetLocalListVersionRequest {}

    /// `GetLocalListVersion.conf` (OCPP 2.0.1).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct GetLocalListVersionResponse {
        /// Current version of the local authorization list; `0` means empty.
        pub version_number: i32,
    }

    /// `DataTransfer.req` (OCPP 2.0.1).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct DataTransferRequest {
        /// Vendor identifier for the custom payload.
        pub vendor_id: String,
        /// Vendor-defined message identifier, if any.
        #[serde(default)]
        pub message_id: Option<String>,
        /// Opaque vendor payload, if any.
        #[serde(default)]
        pub data: Option<String>,
    }

    /// `DataTransfer.conf` (OCPP 2.0.1).
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct DataTransferResponse {
        /// `Accepted`, `Rejected`, `UnknownMessageId`, or `UnknownVendorId`.
        pub status: String,
        /// Opaque vendor reply payload, if any.
        #[serde(default)]
        pub data: Option<String>,
    }

    pub(super) fn register(adapter: &mut VersionAdapter) {
        adapter
            .register::<BootNotificationRequest>("BootNotification", Direction::Request)
            .register::<BootNotificationResponse>("BootNotification", Direction::Response)
            .register::<HeartbeatRequest>("Heartbeat", Direction::Request)
            .register::<HeartbeatResponse>("Heartbeat", Direction::Response)
            .register::<AuthorizeRequest>("Authorize", Direction::Request)
            .register::<AuthorizeResponse>("Authorize", Direction::Response)
            .register::<StatusNotificationRequest>("StatusNotification", Direction::Request)
            .register::<StatusNotificationResponse>("StatusNotification", Direction::Response)
            .register::<GetLocalListVersionRequest>("GetLocalListVersion", Direction::Request)
            .register::<GetLocalListVersionResponse>("GetLocalListVersion", Direction::Response)
            .register::<DataTransferRequest>("DataTransfer", Direction::Request)
            .register::<DataTransferResponse>("DataTransfer", Direction::Response);
    }
}

// Re-exported so call sites can write `actions::HeartbeatRequest` for the
// version-agnostic tests in `super`.
pub use v201::HeartbeatRequest;

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::version::{Direction, VersionAdapter};

    #[rstest]
    fn v16_boot_notification_request_parses() {
        let mut adapter = VersionAdapter::new(Subprotocol::V16);
        v16::register(&mut adapter);
        let shape = adapter
            .shape_for("BootNotification", Direction::Request)
            .expect("registered");
        let payload = json!({
            "charge_point_vendor": "Acme",
            "charge_point_model": "Z1",
        });
        assert!(shape.validate(&payload).is_ok());
    }

    #[rstest]
    fn v201_boot_notification_request_parses() {
        let mut adapter = VersionAdapter::new(Subprotocol::V201);
        v201::register(&mut adapter);
        let shape = adapter
            .shape_for("BootNotification", Direction::Request)
            .expect("registered");
        let payload = json!({
            "charging_station": {"model": "Alpha", "vendor_name": "Vendor"},
            "reason": "PowerUp",
        });
        assert!(shape.validate(&payload).is_ok());
    }

    #[rstest]
    fn v201_boot_notification_rejects_wrong_type() {
        let mut adapter = VersionAdapter::new(Subprotocol::V201);
        v201::register(&mut adapter);
        let shape = adapter
            .shape_for("BootNotification", Direction::Request)
            .expect("registered");
        let payload = json!({
            "charging_station": {"model": 123, "vendor_name": "Vendor"},
            "reason": "PowerUp",
        });
        assert!(shape.validate(&payload).is_err());
    }
}
