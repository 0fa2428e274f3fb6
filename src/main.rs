//! `ocpp-central-system`: the Central-System side OCPP-J runtime, bound to a
//! directly-attached WebSocket listener and an HTTP-tunneled ingress on the
//! same process (§4.C).
//!
//! This binary only assembles library pieces — version adapters, routers,
//! the Application Shell, the two transport variants — and handles process
//! lifecycle (config, logging, graceful shutdown); none of that assembly
//! logic lives in the library itself.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router as AxumRouter;
use axum::routing::{get, post};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ocpp_central::config::Cli;
use ocpp_central::handlers;
use ocpp_central::router::Router;
use ocpp_central::shell::ApplicationShell;
use ocpp_central::transport::http_tunnel::HttpTunnelState;
use ocpp_central::transport::websocket::upgrade_handler;
use ocpp_central::version::{Subprotocol, default_registry};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_parse_error| EnvFilter::new("info")))
        .init();
}

fn parse_subprotocols(config: &str) -> Result<Vec<Subprotocol>> {
    config
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(|tag| Subprotocol::from_wire_tag(tag).with_context(|| format!("unknown subprotocol {tag:?}")))
        .collect()
}

fn build_shell(enabled: &[Subprotocol], response_timeout: Duration) -> ApplicationShell {
    let mut adapters = default_registry();
    let mut routers = HashMap::new();
    for subprotocol in enabled {
        let Some(adapter) = adapters.remove(subprotocol) else {
            continue;
        };
        let mut router = Router::new(*subprotocol, Arc::new(adapter));
        match subprotocol {
            Subprotocol::V16 => handlers::register_v16(&mut router),
            Subprotocol::V20 | Subprotocol::V201 => handlers::register_v201(&mut router),
        }
        routers.insert(*subprotocol, Arc::new(router));
    }
    ApplicationShell::new(routers).with_response_timeout(response_timeout)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        #[expect(clippy::expect_used, reason = "failing to install a signal handler is fatal at startup")]
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        #[expect(clippy::expect_used, reason = "failing to install a signal handler is fatal at startup")]
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl-C handler");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.config;

    let enabled = parse_subprotocols(&config.subprotocols)?;
    anyhow::ensure!(!enabled.is_empty(), "at least one subprotocol must be enabled");
    let response_timeout = Duration::from_secs(config.response_timeout_secs);

    let shell = Arc::new(build_shell(&enabled, response_timeout));
    shell.startup().await;

    #[cfg(feature = "redis-sidechannel")]
    let side_channel = config
        .redis_url
        .as_deref()
        .map(|url| {
            ocpp_central::sidechannel::RedisSideChannel::connect(url, Duration::from_secs(30))
                .context("failed to connect redis side channel")
        })
        .transpose()?
        .map(|channel| Arc::new(channel) as Arc<dyn ocpp_central::transport::http_tunnel::HttpSideChannel>);
    #[cfg(not(feature = "redis-sidechannel"))]
    let side_channel = None;

    let tunnel_state = Arc::new(HttpTunnelState::new(Arc::clone(&shell), side_channel));

    let ws_routes = AxumRouter::new()
        .route("/{charging_station_id}", get(upgrade_handler))
        .with_state(Arc::clone(&shell));
    let tunnel_routes = AxumRouter::new()
        .route(&config.tunnel_path, post(ocpp_central::transport::http_tunnel::tunnel_handler))
        .with_state(tunnel_state);

    let app = ws_routes.merge(tunnel_routes);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(bind = %config.bind, "ocpp-central-system listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated")?;

    shell.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn parses_comma_separated_subprotocols_in_order() {
        let parsed = parse_subprotocols("ocpp2.0.1,ocpp1.6").expect("parse");
        assert_eq!(parsed, vec![Subprotocol::V201, Subprotocol::V16]);
    }

    #[rstest]
    fn rejects_unknown_subprotocol() {
        assert!(parse_subprotocols("ocpp9.9").is_err());
    }

    #[rstest]
    fn build_shell_registers_every_enabled_subprotocol() {
        let shell = build_shell(&[Subprotocol::V16, Subprotocol::V201], Duration::from_secs(30));
        assert_eq!(
            shell.negotiate(&["ocpp1.6".to_owned(), "ocpp2.0.1".to_owned()]),
            Some(Subprotocol::V201)
        );
    }
}
