//! Central-System side runtime for OCPP-J, the JSON-over-WebSocket protocol
//! between Electric-Vehicle Charging Stations and their backend.
//!
//! The library is the protocol runtime only: the message router, the
//! request/response correlation machine, the per-action handler registry,
//! the per-connection concurrency and ordering discipline, the
//! protocol-version adapter layer, and the transport abstraction that lets
//! the same routing core sit behind either a directly-attached WebSocket
//! listener or an HTTP ingress that tunnels individual OCPP frames inside
//! HTTP requests. Demo clients, configuration, and process bootstrap live in
//! the binaries built on top of it.

pub mod codec;
pub mod config;
pub mod connection;
pub mod correlation;
pub mod error;
pub mod handlers;
pub mod router;
pub mod shell;
#[cfg(feature = "redis-sidechannel")]
pub mod sidechannel;
pub mod transport;
pub mod version;
