//! Scrape orchestration.
//!
//! One call to [`PubSubCollector::collect`] is one Prometheus scrape. It runs
//! the Redis queries in a fixed order and writes samples to the caller's sink.
//!
//! # Failure Classes
//!
//! - Fatal: `PING`, `INFO`, channel/pattern/client enumeration, or the
//!   overall timeout. The rest of the scrape is abandoned, `redis_up` is 0 and
//!   the error counter grows by one.
//! - Degraded: a single pattern probe or hash read. Logged and skipped;
//!   the scrape still reports `redis_up` 1.
//!
//! # Concurrency
//!
//! `collect` holds the write half of an `RwLock` for the whole scrape, so
//! scrapes run one at a time in arrival order. Readiness probes take the read
//! half and see the outcome of the last completed scrape.

use crate::collector::client_list::parse_client_list;
use crate::collector::hash_metrics::read_hash_metrics;
use crate::collector::patterns::discover_patterns;
use crate::collector::sample::{
    count_value, Descriptor, MetricSink, Sample, CHANNELS_TOTAL, CHANNEL_SUBSCRIBER_COUNT,
    CLIENTS_TOTAL, CLIENT_CHANNEL_SUBSCRIPTIONS, CLIENT_PATTERN_SUBSCRIPTIONS,
    ORPHAN_CHANNELS_TOTAL, PATTERNS_TOTAL, PATTERN_SUBSCRIBER_COUNT, REDIS_CONNECTED_CLIENTS,
    REDIS_UP, REDIS_USED_MEMORY_BYTES, SCRAPE_DURATION_SECONDS, SCRAPE_ERRORS_TOTAL,
};
use crate::config::HashMetricDef;
use crate::errors::ExporterError;
use crate::redis::{ChannelName, InfoSections, PubSubStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// Time budget for one scrape.
pub const SCRAPE_TIMEOUT: Duration = Duration::from_secs(10);

/// State that outlives a single scrape.
#[derive(Debug, Default)]
struct ScrapeState {
    /// Outcome of the last completed scrape. Starts false.
    redis_up: bool,
    /// Fatal scrape failures since process start.
    scrape_errors: u64,
}

/// Result of one `collect` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrapeOutcome {
    pub up: bool,
    pub duration_seconds: f64,
    pub cumulative_errors: u64,
}

/// Queries Redis on every scrape and emits a fresh metric snapshot.
pub struct PubSubCollector {
    store: Arc<dyn PubSubStore>,
    max_channels: usize,
    known_patterns: Vec<String>,
    hash_metrics: Vec<HashMetricDef>,
    timeout: Duration,
    state: RwLock<ScrapeState>,
}

impl PubSubCollector {
    /// Create a collector with the default scrape timeout.
    pub fn new(
        store: Arc<dyn PubSubStore>,
        max_channels: usize,
        known_patterns: Vec<String>,
        hash_metrics: Vec<HashMetricDef>,
    ) -> Self {
        Self {
            store,
            max_channels,
            known_patterns,
            hash_metrics,
            timeout: SCRAPE_TIMEOUT,
            state: RwLock::new(ScrapeState::default()),
        }
    }

    /// Override the scrape time budget.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs one scrape, writing every sample to `sink`.
    ///
    /// `redis_up`, `scrape_errors_total` and `scrape_duration_seconds` are
    /// emitted exactly once, after all other samples, whether or not the
    /// scrape succeeded.
    pub async fn collect(&self, sink: &mut dyn MetricSink) -> ScrapeOutcome {
        let mut state = self.state.write().await;
        let start = Instant::now();

        let result = match tokio::time::timeout(self.timeout, self.scrape(sink)).await {
            Ok(result) => result,
            Err(_) => Err(ExporterError::Timeout(self.timeout)),
        };

        let up = match result {
            Ok(()) => true,
            Err(e) => {
                state.scrape_errors += 1;
                error!(
                    target: "exporter.collector",
                    error = %e,
                    kind = e.kind(),
                    "Scrape failed"
                );
                false
            }
        };
        state.redis_up = up;

        sink.accept(REDIS_UP.sample(if up { 1.0 } else { 0.0 }));
        sink.accept(SCRAPE_ERRORS_TOTAL.sample(counter_value(state.scrape_errors)));

        let duration_seconds = start.elapsed().as_secs_f64();
        sink.accept(SCRAPE_DURATION_SECONDS.sample(duration_seconds));

        debug!(
            target: "exporter.collector",
            up = up,
            duration_seconds = duration_seconds,
            "Scrape complete"
        );

        ScrapeOutcome {
            up,
            duration_seconds,
            cumulative_errors: state.scrape_errors,
        }
    }

    /// Whether the last completed scrape reached Redis.
    ///
    /// Waits only while a scrape holds the state lock.
    pub async fn is_up(&self) -> bool {
        self.state.read().await.redis_up
    }

    /// Fatal scrape failures since process start.
    pub async fn scrape_errors(&self) -> u64 {
        self.state.read().await.scrape_errors
    }

    /// Everything except the three outcome samples.
    async fn scrape(&self, sink: &mut dyn MetricSink) -> Result<(), ExporterError> {
        self.store.ping().await?;

        // Redis INFO: clients, memory
        let clients_info = self.store.info("clients").await?;
        if let Some(sample) = info_sample(
            &clients_info,
            "clients",
            "connected_clients",
            &REDIS_CONNECTED_CLIENTS,
        ) {
            sink.accept(sample);
        }
        let memory_info = self.store.info("memory").await?;
        if let Some(sample) =
            info_sample(&memory_info, "memory", "used_memory", &REDIS_USED_MEMORY_BYTES)
        {
            sink.accept(sample);
        }

        // 1. Active channels
        let mut channels = self.store.pubsub_channels("*").await?;

        // High cardinality guard
        if channels.len() > self.max_channels {
            warn!(
                target: "exporter.collector",
                count = channels.len(),
                max = self.max_channels,
                "Channel count exceeds MAX_CHANNELS, truncating"
            );
            channels.truncate(self.max_channels);
        }
        sink.accept(CHANNELS_TOTAL.sample(count_value(channels.len())));

        let mut orphans = 0;
        if !channels.is_empty() {
            for (channel, count) in self.store.pubsub_numsub(&channels).await? {
                if count == 0 {
                    orphans += 1;
                }
                sink.accept(
                    CHANNEL_SUBSCRIBER_COUNT
                        .sample(int_value(count))
                        .with_label("channel", channel.to_label()),
                );
            }
        }
        sink.accept(ORPHAN_CHANNELS_TOTAL.sample(count_value(orphans)));

        // 2. Pattern subscriptions
        let numpat = self.store.pubsub_numpat().await?;
        sink.accept(PATTERNS_TOTAL.sample(int_value(numpat)));

        // 3. Clients
        let clients = parse_client_list(&self.store.client_list().await?);
        sink.accept(CLIENTS_TOTAL.sample(count_value(clients.len())));

        for client in &clients {
            if client.sub > 0 {
                sink.accept(client_sample(
                    &CLIENT_CHANNEL_SUBSCRIPTIONS,
                    client.sub,
                    &client.name,
                    &client.addr,
                ));
            }
            if client.psub > 0 {
                sink.accept(client_sample(
                    &CLIENT_PATTERN_SUBSCRIPTIONS,
                    client.psub,
                    &client.name,
                    &client.addr,
                ));
            }
        }

        // 4. Pattern activity (non-UTF-8 channel names do not seed discovery)
        let utf8_channels = channels.iter().filter_map(ChannelName::as_str);
        for pattern in discover_patterns(&self.known_patterns, utf8_channels) {
            match self.store.pubsub_channels(&pattern).await {
                Ok(matching) if !matching.is_empty() => {
                    sink.accept(
                        PATTERN_SUBSCRIBER_COUNT
                            .sample(count_value(matching.len()))
                            .with_label("pattern", pattern),
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        target: "exporter.collector",
                        pattern = %pattern,
                        error = %e,
                        "Failed to query pattern channels"
                    );
                }
            }
        }

        // 5. Hash metrics
        let failed = read_hash_metrics(self.store.as_ref(), &self.hash_metrics, sink).await;
        if failed > 0 {
            debug!(
                target: "exporter.collector",
                failed = failed,
                configured = self.hash_metrics.len(),
                "Hash metrics partially read"
            );
        }

        Ok(())
    }
}

/// Numeric `INFO` field as a sample; missing or non-numeric fields yield none.
fn info_sample(
    info: &InfoSections,
    section: &str,
    field: &str,
    descriptor: &Descriptor,
) -> Option<Sample> {
    let raw = info.section(section)?.get(field)?;
    let value = raw.trim().parse::<f64>().ok()?;
    Some(descriptor.sample(value))
}

fn client_sample(descriptor: &Descriptor, count: i64, name: &str, addr: &str) -> Sample {
    descriptor
        .sample(int_value(count))
        .with_label("client_name", name)
        .with_label("client_addr", addr)
}

// Redis counters are far below 2^53.
#[allow(clippy::cast_precision_loss)]
fn int_value(value: i64) -> f64 {
    value as f64
}

#[allow(clippy::cast_precision_loss)]
fn counter_value(value: u64) -> f64 {
    value as f64
}
