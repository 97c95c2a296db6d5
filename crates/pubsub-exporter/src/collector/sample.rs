//! Metric samples and the sink capability the collector writes to.
//!
//! The collector never talks to a metrics registry directly. It hands each
//! [`Sample`] to a [`MetricSink`]; the HTTP layer supplies a Prometheus sink,
//! tests supply a `Vec<Sample>`.

/// Prometheus metric type of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Gauge,
    Counter,
}

/// One labeled numeric sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Fully qualified metric name (namespace included).
    pub name: String,
    /// HELP text.
    pub help: String,
    pub kind: SampleKind,
    /// Label pairs in emission order.
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl Sample {
    /// Adds a label pair.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self
    }

    /// Returns the value of a label, if present.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Static description of a fixed metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: SampleKind,
}

impl Descriptor {
    const fn gauge(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            kind: SampleKind::Gauge,
        }
    }

    /// Builds an unlabeled sample of this metric.
    pub fn sample(&self, value: f64) -> Sample {
        Sample {
            name: self.name.to_string(),
            help: self.help.to_string(),
            kind: self.kind,
            labels: Vec::new(),
            value,
        }
    }
}

/// Namespace prefix of every exported metric.
pub const NAMESPACE: &str = "redis_pubsub";

// Channel metrics
pub const CHANNEL_SUBSCRIBER_COUNT: Descriptor = Descriptor::gauge(
    "redis_pubsub_channel_subscriber_count",
    "Number of direct subscribers per channel",
);
pub const CHANNELS_TOTAL: Descriptor = Descriptor::gauge(
    "redis_pubsub_channels_total",
    "Total number of active pub/sub channels",
);
pub const ORPHAN_CHANNELS_TOTAL: Descriptor = Descriptor::gauge(
    "redis_pubsub_orphan_channels_total",
    "Number of channels with zero direct subscribers",
);

// Pattern metrics
pub const PATTERN_SUBSCRIBER_COUNT: Descriptor = Descriptor::gauge(
    "redis_pubsub_pattern_subscriber_count",
    "Number of channels matching this pattern with active subscribers",
);
pub const PATTERNS_TOTAL: Descriptor = Descriptor::gauge(
    "redis_pubsub_patterns_total",
    "Total number of active pub/sub pattern subscriptions",
);

// Client metrics
pub const CLIENTS_TOTAL: Descriptor = Descriptor::gauge(
    "redis_pubsub_clients_total",
    "Total number of clients with pub/sub subscriptions",
);
pub const CLIENT_CHANNEL_SUBSCRIPTIONS: Descriptor = Descriptor::gauge(
    "redis_pubsub_client_channel_subscriptions",
    "Number of channel subscriptions per client",
);
pub const CLIENT_PATTERN_SUBSCRIPTIONS: Descriptor = Descriptor::gauge(
    "redis_pubsub_client_pattern_subscriptions",
    "Number of pattern subscriptions per client",
);

// Redis health
pub const REDIS_UP: Descriptor = Descriptor::gauge(
    "redis_pubsub_exporter_redis_up",
    "Whether Redis is reachable (1=up, 0=down)",
);
pub const REDIS_CONNECTED_CLIENTS: Descriptor = Descriptor::gauge(
    "redis_pubsub_exporter_redis_connected_clients",
    "Total number of connected Redis clients",
);
pub const REDIS_USED_MEMORY_BYTES: Descriptor = Descriptor::gauge(
    "redis_pubsub_exporter_redis_used_memory_bytes",
    "Redis used memory in bytes",
);

// Exporter health
pub const SCRAPE_DURATION_SECONDS: Descriptor = Descriptor::gauge(
    "redis_pubsub_exporter_scrape_duration_seconds",
    "Duration of the last scrape",
);
pub const SCRAPE_ERRORS_TOTAL: Descriptor = Descriptor {
    name: "redis_pubsub_exporter_scrape_errors_total",
    help: "Total number of scrape errors",
    kind: SampleKind::Counter,
};
pub const BUILD_INFO: Descriptor = Descriptor::gauge(
    "redis_pubsub_exporter_build_info",
    "Build information for the Redis PubSub Exporter",
);

/// Every fixed metric the exporter emits.
pub const BUILTIN_METRICS: [Descriptor; 14] = [
    CHANNEL_SUBSCRIBER_COUNT,
    CHANNELS_TOTAL,
    ORPHAN_CHANNELS_TOTAL,
    PATTERN_SUBSCRIBER_COUNT,
    PATTERNS_TOTAL,
    CLIENTS_TOTAL,
    CLIENT_CHANNEL_SUBSCRIPTIONS,
    CLIENT_PATTERN_SUBSCRIPTIONS,
    REDIS_UP,
    REDIS_CONNECTED_CLIENTS,
    REDIS_USED_MEMORY_BYTES,
    SCRAPE_DURATION_SECONDS,
    SCRAPE_ERRORS_TOTAL,
    BUILD_INFO,
];

/// Receives samples as the collector produces them.
///
/// Writes are visible to the owner immediately; there is no buffering
/// contract and no way to retract a sample.
pub trait MetricSink: Send {
    fn accept(&mut self, sample: Sample);
}

impl MetricSink for Vec<Sample> {
    fn accept(&mut self, sample: Sample) {
        self.push(sample);
    }
}

/// Converts a count to a gauge value.
// Counts are far below 2^53, so no precision is lost in practice.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn count_value(count: usize) -> f64 {
    count as f64
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_sample() {
        let sample = CHANNELS_TOTAL.sample(3.0);
        assert_eq!(sample.name, "redis_pubsub_channels_total");
        assert_eq!(sample.kind, SampleKind::Gauge);
        assert!(sample.labels.is_empty());
        assert!((sample.value - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_labels_keep_order() {
        let sample = CLIENT_CHANNEL_SUBSCRIPTIONS
            .sample(2.0)
            .with_label("client_name", "orders")
            .with_label("client_addr", "10.0.0.1:1234");

        assert_eq!(sample.label("client_name"), Some("orders"));
        assert_eq!(sample.label("client_addr"), Some("10.0.0.1:1234"));
        assert_eq!(sample.label("channel"), None);
        assert_eq!(sample.labels[0].0, "client_name");
    }

    #[test]
    fn test_all_names_share_namespace() {
        for descriptor in BUILTIN_METRICS {
            assert!(descriptor.name.starts_with(NAMESPACE));
        }
        assert_eq!(SCRAPE_ERRORS_TOTAL.kind, SampleKind::Counter);
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let mut names: Vec<&str> = BUILTIN_METRICS.iter().map(|d| d.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUILTIN_METRICS.len());
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut sink: Vec<Sample> = Vec::new();
        sink.accept(REDIS_UP.sample(1.0));
        sink.accept(SCRAPE_ERRORS_TOTAL.sample(0.0));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].name, REDIS_UP.name);
    }
}
