//! Optional Redis-backed side channel (`redis-sidechannel` feature).
//!
//! Gives the HTTP-tunneled Transport Adapter a place to publish
//! server-originated frames for an out-of-process WebSocket proxy to pick
//! up. Grounded on the bundled serverless demo's `Pipe`/`PubSub` primitives:
//! `Pipe` is a one-shot key/value rendezvous (used here for publishing one
//! outbound frame to a known `connection_id`), `PubSub` is fan-out. The
//! WebSocket transport variant never needs this — it holds the live socket
//! directly.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;
use tracing::debug;

use crate::transport::TransportError;
use crate::transport::http_tunnel::HttpSideChannel;

/// Errors raised by the Redis-backed side channel.
#[derive(Debug, Error)]
pub enum SideChannelError {
    /// The underlying Redis connection failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Publishes one outbound OCPP-J frame to the proxy instance holding
/// `connection_id`'s live socket, mirroring `Pipe.send` (original
/// `misc/channel.py`): a short-lived key/value entry rather than a pub/sub
/// fan-out, since exactly one proxy instance owns a given connection.
pub struct RedisSideChannel {
    client: redis::Client,
    expire: Duration,
}

impl RedisSideChannel {
    /// Connect to `redis_url`. The entries this channel writes expire after
    /// `expire` if the proxy never collects them.
    ///
    /// # Errors
    ///
    /// Returns [`SideChannelError::Redis`] if the URL cannot be parsed into a
    /// client.
    pub fn connect(redis_url: &str, expire: Duration) -> Result<Self, SideChannelError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client, expire })
    }

    /// Publish `text` for `connection_id` to pick up.
    ///
    /// # Errors
    ///
    /// Returns [`SideChannelError::Redis`] if the connection or the `SET`
    /// command fails.
    pub async fn publish(&self, connection_id: &str, text: &str) -> Result<(), SideChannelError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("ocpp-central:outbound:{connection_id}");
        debug!(connection_id, key, "publishing outbound frame to side channel");
        let () = conn
            .set_ex(key, text, self.expire.as_secs().max(1))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl HttpSideChannel for RedisSideChannel {
    async fn send(&self, connection_id: &str, text: &str) -> Result<(), TransportError> {
        self.publish(connection_id, text)
            .await
            .map_err(|_redis_error| TransportError::SideChannelUnavailable)
    }
}
