//! Redis client for publishing real-time sniper updates.
//!
//! The engine publishes to pub/sub channels for live dashboards, mirrors the
//! latest value into a state key with a TTL, and appends history to capped
//! streams. All publishing is fire-and-forget; Redis being down degrades the
//! bot to log-only operation.
//!
//! Channels:
//! - `sniper:signals` - detected edges (fired or dry-run)
//! - `sniper:fills`   - confirmed fills from the trade socket
//! - `sniper:state`   - periodic engine status snapshots

use anyhow::{Context, Result};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Redis channel names (pub/sub for live updates)
pub mod channels {
    pub const SIGNALS: &str = "sniper:signals";
    pub const FILLS: &str = "sniper:fills";
    pub const STATE: &str = "sniper:state";
}

/// Redis key prefixes (latest state)
pub mod keys {
    pub const SIGNAL_STATE: &str = "sniper:signal";
    pub const ENGINE_STATE: &str = "sniper:engine";
}

/// Redis stream names (persistent history)
pub mod streams {
    pub const SIGNALS_STREAM: &str = "sniper:signals:stream";
    pub const FILLS_STREAM: &str = "sniper:fills:stream";
}

/// State key TTL in seconds
const STATE_TTL_SECS: u64 = 3600;

/// Max entries kept per stream
const STREAM_MAX_LEN: usize = 100_000;

/// Redis client wrapper with lazy connection
#[derive(Clone)]
pub struct RedisClient {
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    url: String,
}

impl RedisClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            connection: Arc::new(RwLock::new(None)),
            url: url.into(),
        }
    }

    /// Create a new client and connect immediately
    pub async fn new_connected(url: impl Into<String>) -> Result<Self> {
        let client = Self::new(url);
        client.connect().await?;
        Ok(client)
    }

    /// Create from REDIS_URL (defaults to localhost)
    pub async fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        Self::new_connected(url).await
    }

    /// Connect to Redis
    pub async fn connect(&self) -> Result<()> {
        let client =
            redis::Client::open(self.url.as_str()).context("Failed to create Redis client")?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")?;

        info!("[REDIS] Connected to {}", self.url);

        *self.connection.write().await = Some(connection);
        Ok(())
    }

    /// Check if connected
    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let guard = self.connection.read().await;
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Not connected to Redis"))
    }

    /// Publish a message to a channel
    pub async fn publish(&self, channel: &str, message: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .publish(channel, message)
            .await
            .context("Failed to publish message")?;

        debug!("[REDIS] Published to {}: {} bytes", channel, message.len());
        Ok(())
    }

    /// Set a state key with TTL
    pub async fn set_state(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .set_ex(key, value, STATE_TTL_SECS)
            .await
            .context("Failed to set state key")?;

        debug!("[REDIS] Set {}: {} bytes", key, value.len());
        Ok(())
    }

    /// Append to a capped stream (XADD with approximate MAXLEN trimming)
    pub async fn stream_add(&self, stream: &str, data: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("XADD")
            .arg(stream)
            .arg("MAXLEN")
            .arg("~")
            .arg(STREAM_MAX_LEN)
            .arg("*")
            .arg("data")
            .arg(data)
            .query_async(&mut conn)
            .await
            .context("Failed to add to stream")?;

        debug!("[REDIS] Stream {}: {} bytes", stream, data.len());
        Ok(())
    }

    // =========================================================================
    // Fire-and-forget publishing used by the engine
    // =========================================================================

    /// Publish a snipe signal: channel + per-ticker state key + stream.
    pub fn publish_signal(&self, json: String, ticker: &str) {
        let state_key = format!("{}:{}", keys::SIGNAL_STATE, ticker);
        self.spawn_publish(channels::SIGNALS, Some(state_key), Some(streams::SIGNALS_STREAM), json);
    }

    /// Publish a fill confirmation: channel + stream.
    pub fn publish_fill(&self, json: String) {
        self.spawn_publish(channels::FILLS, None, Some(streams::FILLS_STREAM), json);
    }

    /// Publish an engine status snapshot: channel + state key.
    pub fn publish_engine_state(&self, json: String) {
        self.spawn_publish(
            channels::STATE,
            Some(keys::ENGINE_STATE.to_string()),
            None,
            json,
        );
    }

    fn spawn_publish(
        &self,
        channel: &'static str,
        state_key: Option<String>,
        stream: Option<&'static str>,
        json: String,
    ) {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(e) = client.publish(channel, &json).await {
                warn!("[REDIS] Publish to {} failed: {}", channel, e);
                return;
            }
            if let Some(key) = state_key {
                if let Err(e) = client.set_state(&key, &json).await {
                    warn!("[REDIS] Set {} failed: {}", key, e);
                }
            }
            if let Some(stream) = stream {
                if let Err(e) = client.stream_add(stream, &json).await {
                    warn!("[REDIS] Stream {} failed: {}", stream, e);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires running Redis server
    async fn test_connect() {
        let client = RedisClient::new_connected("redis://127.0.0.1:6379")
            .await
            .expect("Failed to connect");

        assert!(client.is_connected().await);
    }

    #[tokio::test]
    #[ignore] // Requires running Redis server
    async fn test_publish_and_state() {
        let client = RedisClient::new_connected("redis://127.0.0.1:6379")
            .await
            .expect("Failed to connect");

        client
            .publish(channels::SIGNALS, "{\"test\":true}")
            .await
            .expect("Failed to publish");

        client
            .set_state("sniper:test", "{\"test\":true}")
            .await
            .expect("Failed to set state");
    }
}
