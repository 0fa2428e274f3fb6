//! Runtime configuration for the `ocpp-central-system` binary (§10 ambient
//! stack).
//!
//! Layered the way the codebase this is modeled on layers its own server
//! configuration: a `clap`-derived CLI flattened over an `ortho_config`
//! struct that also reads `OCPP_`-prefixed environment variables and an
//! optional dotfile, generalized here from a single `bind`/`database` pair
//! to the fields this runtime needs.

use clap::{Args, Parser};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

/// Runtime configuration shared by the Central System binary.
#[expect(
    missing_docs,
    reason = "OrthoConfig derive macro generates items that cannot be documented"
)]
#[derive(Args, OrthoConfig, Serialize, Deserialize, Default, Debug, Clone)]
#[ortho_config(prefix = "OCPP_")]
pub struct AppConfig {
    /// Address the WebSocket and HTTP-tunnel listener binds to.
    #[ortho_config(default = "0.0.0.0:9000".to_owned())]
    #[arg(long, default_value_t = String::from("0.0.0.0:9000"))]
    pub bind: String,

    /// Comma-separated list of subprotocols to accept, in the order they
    /// should be tried; unknown tags are rejected at startup.
    #[ortho_config(default = "ocpp2.0.1,ocpp2.0,ocpp1.6".to_owned())]
    #[arg(long, default_value_t = String::from("ocpp2.0.1,ocpp2.0,ocpp1.6"))]
    pub subprotocols: String,

    /// Deadline, in seconds, for an outbound `call(...)` awaiting its reply
    /// (§5's `response_timeout`).
    #[ortho_config(default = 30)]
    #[arg(long, default_value_t = 30)]
    pub response_timeout_secs: u64,

    /// URL path the HTTP-tunneled ingress listens on (§6).
    #[ortho_config(default = "/ocpp/event".to_owned())]
    #[arg(long, default_value_t = String::from("/ocpp/event"))]
    pub tunnel_path: String,

    /// Redis connection URL for the optional server-initiated-call side
    /// channel (`redis-sidechannel` feature only).
    #[ortho_config(default = None)]
    #[arg(long)]
    pub redis_url: Option<String>,
}

/// Top-level CLI entry point for `ocpp-central-system`.
#[derive(Parser, Deserialize, Serialize, Debug, Clone)]
pub struct Cli {
    /// Application configuration.
    #[command(flatten)]
    pub config: AppConfig,
}
