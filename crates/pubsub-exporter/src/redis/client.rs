//! Redis implementation of [`PubSubStore`].
//!
//! # Connection Pattern
//!
//! The connection is established lazily on the first command and kept in a
//! `ConnectionManager`, which is cheap to clone and reconnects on its own
//! after the server goes away. The exporter therefore starts (and serves
//! `redis_up = 0`) while Redis is still unreachable.
//!
//! # Timeouts
//!
//! Connecting is a single attempt bounded by [`CONNECT_TIMEOUT`], and every
//! command is bounded by [`RESPONSE_TIMEOUT`]. An unreachable server fails
//! the scrape well inside its own budget; the next scrape connects again.
//!
//! # Usage
//!
//! ```rust,ignore
//! let client = RedisPubSubClient::new(config.redis.url()?.expose_secret())?;
//! let channels = client.pubsub_channels("*").await?;
//! ```

use crate::errors::ExporterError;
use crate::redis::info::InfoSections;
use crate::redis::store::{ChannelName, PubSubStore};
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{Client, RedisError, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, instrument};

/// Time allowed for one connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Time allowed for the reply to one command.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection attempts after the first failed one, per scrape.
pub const CONNECT_RETRIES: usize = 0;

fn manager_config() -> ConnectionManagerConfig {
    ConnectionManagerConfig::new()
        .set_number_of_retries(CONNECT_RETRIES)
        .set_connection_timeout(CONNECT_TIMEOUT)
        .set_response_timeout(RESPONSE_TIMEOUT)
}

/// Pub/sub introspection client backed by a lazily created `ConnectionManager`.
pub struct RedisPubSubClient {
    client: Client,
    connection: OnceCell<ConnectionManager>,
}

impl RedisPubSubClient {
    /// Create a new client without connecting.
    ///
    /// # Errors
    ///
    /// Returns `ExporterError::Config` if the URL cannot be parsed.
    pub fn new(redis_url: &str) -> Result<Self, ExporterError> {
        let client = Client::open(redis_url).map_err(|e| {
            // Note: Do NOT log redis_url as it may contain credentials
            error!(
                target: "exporter.redis.client",
                error = %e,
                "Failed to open Redis client"
            );
            ExporterError::Config(format!("Failed to open Redis client: {e}"))
        })?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    /// Returns a clone of the shared connection, connecting on first use.
    ///
    /// A failed connect leaves the cell empty so the next scrape retries.
    async fn connection(&self) -> Result<ConnectionManager, ExporterError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                ConnectionManager::new_with_config(self.client.clone(), manager_config())
                    .await
                    .map_err(|e| command_error("CONNECT", &e))
            })
            .await?;
        Ok(manager.clone())
    }
}

/// Pairs the flat `NUMSUB` reply: channel, count, channel, count, ...
fn numsub_pairs(reply: &[Value]) -> Result<Vec<(ChannelName, i64)>, ExporterError> {
    reply
        .chunks_exact(2)
        .map(|pair| match pair {
            [name, count] => {
                let name: Vec<u8> = redis::from_redis_value(name)
                    .map_err(|e| command_error("PUBSUB NUMSUB", &e))?;
                let count: i64 = redis::from_redis_value(count)
                    .map_err(|e| command_error("PUBSUB NUMSUB", &e))?;
                Ok((ChannelName::from(name), count))
            }
            _ => Err(ExporterError::Redis(
                "PUBSUB NUMSUB returned a malformed reply".to_string(),
            )),
        })
        .collect()
}

fn command_error(command: &'static str, e: &RedisError) -> ExporterError {
    debug!(
        target: "exporter.redis.client",
        command = command,
        error = %e,
        "Redis command failed"
    );
    ExporterError::Redis(format!("{command} failed: {e}"))
}

#[async_trait]
impl PubSubStore for RedisPubSubClient {
    #[instrument(skip_all)]
    async fn ping(&self) -> Result<(), ExporterError> {
        let mut conn = self.connection().await?;
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("PING", &e))?;
        Ok(())
    }

    #[instrument(skip_all, fields(section = %section))]
    async fn info(&self, section: &str) -> Result<InfoSections, ExporterError> {
        let mut conn = self.connection().await?;
        let raw: String = redis::cmd("INFO")
            .arg(section)
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("INFO", &e))?;
        Ok(InfoSections::parse(&raw))
    }

    #[instrument(skip_all, fields(pattern = %pattern))]
    async fn pubsub_channels(&self, pattern: &str) -> Result<Vec<ChannelName>, ExporterError> {
        let mut conn = self.connection().await?;
        let names: Vec<Vec<u8>> = redis::cmd("PUBSUB")
            .arg("CHANNELS")
            .arg(pattern)
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("PUBSUB CHANNELS", &e))?;
        Ok(names.into_iter().map(ChannelName::from).collect())
    }

    #[instrument(skip_all, fields(channels = channels.len()))]
    async fn pubsub_numsub(
        &self,
        channels: &[ChannelName],
    ) -> Result<Vec<(ChannelName, i64)>, ExporterError> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("PUBSUB");
        cmd.arg("NUMSUB");
        for channel in channels {
            cmd.arg(channel.as_bytes());
        }
        let reply: Vec<Value> = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("PUBSUB NUMSUB", &e))?;

        numsub_pairs(&reply)
    }

    #[instrument(skip_all)]
    async fn pubsub_numpat(&self) -> Result<i64, ExporterError> {
        let mut conn = self.connection().await?;
        redis::cmd("PUBSUB")
            .arg("NUMPAT")
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("PUBSUB NUMPAT", &e))
    }

    #[instrument(skip_all)]
    async fn client_list(&self) -> Result<String, ExporterError> {
        let mut conn = self.connection().await?;
        redis::cmd("CLIENT")
            .arg("LIST")
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("CLIENT LIST", &e))
    }

    #[instrument(skip_all, fields(key = %key))]
    async fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, ExporterError> {
        let mut conn = self.connection().await?;
        let fields: BTreeMap<String, String> = redis::cmd("HGETALL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("HGETALL", &e))?;
        Ok(fields.into_iter().collect())
    }
}
