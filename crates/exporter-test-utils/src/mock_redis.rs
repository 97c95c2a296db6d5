//! In-memory Redis mock for collector testing.
//!
//! Provides an in-memory implementation of the commands a scrape issues:
//! - `PUBSUB CHANNELS` / `NUMSUB` / `NUMPAT` over a channel table
//! - `CLIENT LIST` and `INFO` from canned replies
//! - `HGETALL` over in-memory hashes
//!
//! Unlike a real server, `PUBSUB CHANNELS` also returns channels with zero
//! subscribers so that orphan handling can be exercised.
//!
//! # Example
//!
//! ```rust,ignore
//! use exporter_test_utils::{Command, MockRedis};
//!
//! let redis = MockRedis::new()
//!     .with_channel("orders.created", 2)
//!     .with_hash("app:users", &[("shard-1", "10")])
//!     .failing(Command::PubsubNumpat);
//! ```

use async_trait::async_trait;
use pubsub_exporter::errors::ExporterError;
use pubsub_exporter::redis::{ChannelName, InfoSections, PubSubStore};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::fixtures::{info_clients, info_memory};

/// Commands the mock can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Ping,
    Info,
    PubsubChannels,
    PubsubNumsub,
    PubsubNumpat,
    ClientList,
    Hgetall,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Ping => "PING",
            Command::Info => "INFO",
            Command::PubsubChannels => "PUBSUB CHANNELS",
            Command::PubsubNumsub => "PUBSUB NUMSUB",
            Command::PubsubNumpat => "PUBSUB NUMPAT",
            Command::ClientList => "CLIENT LIST",
            Command::Hgetall => "HGETALL",
        };
        f.write_str(name)
    }
}

/// Mock Redis for testing the collector.
#[derive(Debug, Clone)]
pub struct MockRedis {
    inner: Arc<Mutex<MockRedisInner>>,
}

#[derive(Debug, Default)]
struct MockRedisInner {
    /// Channel table in server order: (name, direct subscribers)
    channels: Vec<(ChannelName, i64)>,
    numpat: i64,
    client_list: String,
    /// Raw `INFO` text per section name
    info: HashMap<String, String>,
    hashes: HashMap<String, Vec<(String, String)>>,
    failing: HashSet<Command>,
    /// Patterns whose `PUBSUB CHANNELS` probe fails
    failing_patterns: HashSet<String>,
    /// Hash keys whose `HGETALL` fails
    failing_hashes: HashSet<String>,
    latency: Option<Duration>,
    /// Every command issued, rendered with its first argument
    calls: Vec<String>,
}

impl Default for MockRedis {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRedis {
    /// Create a reachable MockRedis with no channels or clients.
    ///
    /// `INFO clients` reports 1 connected client and `INFO memory` 1 MiB.
    #[must_use]
    pub fn new() -> Self {
        let mut inner = MockRedisInner::default();
        inner.info.insert("clients".to_string(), info_clients(1));
        inner.info.insert("memory".to_string(), info_memory(1_048_576));
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Add a channel with `subscribers` direct subscribers.
    #[must_use]
    pub fn with_channel(self, name: &str, subscribers: i64) -> Self {
        self.set_channel(name, subscribers);
        self
    }

    /// Add a channel whose name is arbitrary bytes.
    #[must_use]
    pub fn with_raw_channel(self, name: &[u8], subscribers: i64) -> Self {
        self.upsert_channel(ChannelName::from(name), subscribers);
        self
    }

    /// Add several channels, keeping their order.
    #[must_use]
    pub fn with_channels(self, channels: &[(String, i64)]) -> Self {
        for (name, subscribers) in channels {
            self.set_channel(name, *subscribers);
        }
        self
    }

    #[must_use]
    pub fn with_numpat(self, numpat: i64) -> Self {
        self.inner.lock().unwrap().numpat = numpat;
        self
    }

    /// Set the raw `CLIENT LIST` reply.
    #[must_use]
    pub fn with_client_list(self, raw: &str) -> Self {
        self.inner.lock().unwrap().client_list = raw.to_string();
        self
    }

    /// Set the raw `INFO <section>` reply.
    #[must_use]
    pub fn with_info(self, section: &str, raw: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .info
            .insert(section.to_string(), raw.to_string());
        self
    }

    #[must_use]
    pub fn with_hash(self, key: &str, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(f, v)| ((*f).to_string(), (*v).to_string()))
            .collect();
        self.inner
            .lock()
            .unwrap()
            .hashes
            .insert(key.to_string(), fields);
        self
    }

    /// Make every call of `command` fail.
    #[must_use]
    pub fn failing(self, command: Command) -> Self {
        self.fail(command);
        self
    }

    /// Make the `PUBSUB CHANNELS <pattern>` probe fail for one pattern.
    #[must_use]
    pub fn failing_pattern(self, pattern: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .failing_patterns
            .insert(pattern.to_string());
        self
    }

    /// Make `HGETALL <key>` fail for one key.
    #[must_use]
    pub fn failing_hash(self, key: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .failing_hashes
            .insert(key.to_string());
        self
    }

    /// Delay every command by `latency`.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.inner.lock().unwrap().latency = Some(latency);
        self
    }

    /// Insert or update a channel.
    pub fn set_channel(&self, name: &str, subscribers: i64) {
        self.upsert_channel(ChannelName::from(name), subscribers);
    }

    fn upsert_channel(&self, name: ChannelName, subscribers: i64) {
        let mut inner = self.inner.lock().unwrap();
        match inner.channels.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = subscribers,
            None => inner.channels.push((name, subscribers)),
        }
    }

    /// Remove a channel. Returns whether it existed.
    pub fn remove_channel(&self, name: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.channels.len();
        inner.channels.retain(|(n, _)| n != name);
        inner.channels.len() != before
    }

    /// Start failing `command`.
    pub fn fail(&self, command: Command) {
        self.inner.lock().unwrap().failing.insert(command);
    }

    /// Stop failing `command`.
    pub fn recover(&self, command: Command) {
        self.inner.lock().unwrap().failing.remove(&command);
    }

    /// Commands issued so far, e.g. `PUBSUB CHANNELS orders.*`.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of issued commands whose rendering starts with `prefix`.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Records the call, applies latency, and checks failure injection.
    ///
    /// The lock is released before sleeping.
    async fn begin(&self, command: Command, arg: Option<&str>) -> Result<(), ExporterError> {
        let (latency, fails) = {
            let mut inner = self.inner.lock().unwrap();
            let rendered = match arg {
                Some(arg) => format!("{command} {arg}"),
                None => command.to_string(),
            };
            inner.calls.push(rendered);

            let fails = inner.failing.contains(&command)
                || match (command, arg) {
                    (Command::PubsubChannels, Some(p)) => inner.failing_patterns.contains(p),
                    (Command::Hgetall, Some(k)) => inner.failing_hashes.contains(k),
                    _ => false,
                };
            (inner.latency, fails)
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if fails {
            Err(ExporterError::Redis(format!("mock {command} failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PubSubStore for MockRedis {
    async fn ping(&self) -> Result<(), ExporterError> {
        self.begin(Command::Ping, None).await
    }

    async fn info(&self, section: &str) -> Result<InfoSections, ExporterError> {
        self.begin(Command::Info, Some(section)).await?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .info
            .get(section)
            .map(|raw| InfoSections::parse(raw))
            .unwrap_or_default())
    }

    async fn pubsub_channels(&self, pattern: &str) -> Result<Vec<ChannelName>, ExporterError> {
        self.begin(Command::PubsubChannels, Some(pattern)).await?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .channels
            .iter()
            .filter(|(name, _)| glob_match(pattern, &name.to_label()))
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn pubsub_numsub(
        &self,
        channels: &[ChannelName],
    ) -> Result<Vec<(ChannelName, i64)>, ExporterError> {
        let first = channels.first().map(ChannelName::to_label);
        self.begin(Command::PubsubNumsub, first.as_deref()).await?;
        let inner = self.inner.lock().unwrap();
        Ok(channels
            .iter()
            .map(|requested| {
                let count = inner
                    .channels
                    .iter()
                    .find(|(name, _)| name == requested)
                    .map_or(0, |(_, count)| *count);
                (requested.clone(), count)
            })
            .collect())
    }

    async fn pubsub_numpat(&self) -> Result<i64, ExporterError> {
        self.begin(Command::PubsubNumpat, None).await?;
        Ok(self.inner.lock().unwrap().numpat)
    }

    async fn client_list(&self) -> Result<String, ExporterError> {
        self.begin(Command::ClientList, None).await?;
        Ok(self.inner.lock().unwrap().client_list.clone())
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, ExporterError> {
        self.begin(Command::Hgetall, Some(key)).await?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .hashes
            .get(key)
            .cloned()
            .unwrap_or_default())
    }
}

/// Redis-style glob supporting `*` and `?`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("*", "anything"));
        assert!(glob_match("*", ""));
        assert!(glob_match("orders.*", "orders.created"));
        assert!(glob_match("orders.*", "orders."));
        assert!(!glob_match("orders.*", "orders"));
        assert!(!glob_match("orders.*", "billing.paid"));
        assert!(glob_match("a?c", "abc"));
        assert!(!glob_match("a?c", "ac"));
        assert!(glob_match("*.created", "orders.created"));
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(!glob_match("a*b*c", "axxbyy"));
    }

    #[tokio::test]
    async fn test_channel_table() {
        let redis = MockRedis::new()
            .with_channel("orders.created", 2)
            .with_channel("billing.paid", 0);

        let all = redis.pubsub_channels("*").await.unwrap();
        assert_eq!(all, vec!["orders.created", "billing.paid"]);

        let billing = ChannelName::from("billing.paid");
        let missing = ChannelName::from("missing");
        let counts = redis
            .pubsub_numsub(&[billing.clone(), missing.clone()])
            .await
            .unwrap();
        assert_eq!(counts, vec![(billing.clone(), 0), (missing, 0)]);

        redis.set_channel("billing.paid", 5);
        assert!(redis.remove_channel("orders.created"));
        assert!(!redis.remove_channel("orders.created"));
        let counts = redis
            .pubsub_numsub(std::slice::from_ref(&billing))
            .await
            .unwrap();
        assert_eq!(counts, vec![(billing, 5)]);
    }

    #[tokio::test]
    async fn test_raw_channel_names() {
        let raw = [0xff, 0xfe, b'x'];
        let redis = MockRedis::new().with_raw_channel(&raw, 2);

        let all = redis.pubsub_channels("*").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].as_bytes(), &raw);

        let counts = redis.pubsub_numsub(&all).await.unwrap();
        assert_eq!(counts, vec![(ChannelName::from(&raw[..]), 2)]);
    }

    #[tokio::test]
    async fn test_failure_injection_and_recovery() {
        let redis = MockRedis::new().failing(Command::Ping);
        assert!(redis.ping().await.is_err());

        redis.recover(Command::Ping);
        assert!(redis.ping().await.is_ok());
        assert_eq!(redis.call_count("PING"), 2);
    }

    #[tokio::test]
    async fn test_targeted_failures() {
        let redis = MockRedis::new()
            .with_channel("orders.created", 1)
            .with_hash("good", &[("a", "1")])
            .failing_pattern("orders.*")
            .failing_hash("bad");

        assert!(redis.pubsub_channels("*").await.is_ok());
        assert!(redis.pubsub_channels("orders.*").await.is_err());
        assert!(redis.hgetall("good").await.is_ok());
        assert!(redis.hgetall("bad").await.is_err());
        assert!(redis.hgetall("absent").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_default_info_sections() {
        let redis = MockRedis::new();
        let clients = redis.info("clients").await.unwrap();
        assert_eq!(
            clients
                .section("clients")
                .and_then(|s| s.get("connected_clients"))
                .map(String::as_str),
            Some("1")
        );
    }
}
