//! Prometheus text rendering for collector samples.
//!
//! Every scrape renders into a fresh `PrometheusRecorder` that is never
//! installed globally. A channel or client that disappears from Redis
//! therefore disappears from the next response instead of lingering as a
//! stale series.

use crate::collector::sample::{MetricSink, Sample, SampleKind, BUILD_INFO};
use metrics::{Key, KeyName, Label, Level, Metadata, Recorder, SharedString};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusRecorder};

static METADATA: Metadata<'static> =
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

/// Exporter version reported by `redis_pubsub_exporter_build_info`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Source revision, from `PUBSUB_EXPORTER_COMMIT` at build time.
pub const COMMIT: &str = match option_env!("PUBSUB_EXPORTER_COMMIT") {
    Some(commit) => commit,
    None => "none",
};

/// Build date, from `PUBSUB_EXPORTER_BUILD_DATE` at build time.
pub const BUILD_DATE: &str = match option_env!("PUBSUB_EXPORTER_BUILD_DATE") {
    Some(date) => date,
    None => "unknown",
};

/// `MetricSink` backed by a private Prometheus recorder.
pub struct PrometheusSink {
    recorder: PrometheusRecorder,
}

impl Default for PrometheusSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PrometheusSink {
    #[must_use]
    pub fn new() -> Self {
        Self {
            recorder: PrometheusBuilder::new().build_recorder(),
        }
    }

    /// Renders everything accepted so far in the Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.recorder.handle().render()
    }
}

impl MetricSink for PrometheusSink {
    fn accept(&mut self, sample: Sample) {
        let Sample {
            name,
            help,
            kind,
            labels,
            value,
        } = sample;

        let labels: Vec<Label> = labels
            .into_iter()
            .map(|(key, value)| Label::new(key, value))
            .collect();
        let key = Key::from_parts(name.clone(), labels);
        let description = SharedString::from(help);

        match kind {
            SampleKind::Gauge => {
                self.recorder
                    .describe_gauge(KeyName::from(name), None, description);
                self.recorder.register_gauge(&key, &METADATA).set(value);
            }
            SampleKind::Counter => {
                self.recorder
                    .describe_counter(KeyName::from(name), None, description);
                self.recorder
                    .register_counter(&key, &METADATA)
                    .absolute(counter_value(value));
            }
        }
    }
}

/// The constant build information sample.
pub fn build_info() -> Sample {
    BUILD_INFO
        .sample(1.0)
        .with_label("version", VERSION)
        .with_label("commit", COMMIT)
        .with_label("date", BUILD_DATE)
}

// Counter samples carry whole non-negative values.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn counter_value(value: f64) -> u64 {
    value.max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::sample::{
        CHANNEL_SUBSCRIBER_COUNT, CHANNELS_TOTAL, REDIS_UP, SCRAPE_ERRORS_TOTAL,
    };

    #[test]
    fn test_gauge_renders_with_help_and_type() {
        let mut sink = PrometheusSink::new();
        sink.accept(CHANNELS_TOTAL.sample(3.0));

        let text = sink.render();
        assert!(text.contains("# HELP redis_pubsub_channels_total Total number of active pub/sub channels"));
        assert!(text.contains("# TYPE redis_pubsub_channels_total gauge"));
        assert!(text.contains("redis_pubsub_channels_total 3"));
    }

    #[test]
    fn test_counter_renders_as_counter() {
        let mut sink = PrometheusSink::new();
        sink.accept(SCRAPE_ERRORS_TOTAL.sample(2.0));

        let text = sink.render();
        assert!(text.contains("# TYPE redis_pubsub_exporter_scrape_errors_total counter"));
        assert!(text.contains("redis_pubsub_exporter_scrape_errors_total 2"));
    }

    #[test]
    fn test_labels_are_rendered() {
        let mut sink = PrometheusSink::new();
        sink.accept(
            CHANNEL_SUBSCRIBER_COUNT
                .sample(4.0)
                .with_label("channel", "orders.created"),
        );

        let text = sink.render();
        assert!(text.contains(r#"redis_pubsub_channel_subscriber_count{channel="orders.created"} 4"#));
    }

    #[test]
    fn test_each_sink_starts_empty() {
        let mut first = PrometheusSink::new();
        first.accept(REDIS_UP.sample(1.0));
        assert!(first.render().contains("redis_pubsub_exporter_redis_up"));

        let second = PrometheusSink::new();
        assert!(!second.render().contains("redis_pubsub_exporter_redis_up"));
    }

    #[test]
    fn test_build_info_carries_version_commit_and_date() {
        let sample = build_info();
        assert_eq!(sample.name, "redis_pubsub_exporter_build_info");
        assert_eq!(sample.label("version"), Some(VERSION));
        assert_eq!(sample.label("commit"), Some(COMMIT));
        assert_eq!(sample.label("date"), Some(BUILD_DATE));
        assert!((sample.value - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_build_info_renders_all_labels() {
        let mut sink = PrometheusSink::new();
        sink.accept(build_info());

        let text = sink.render();
        assert!(text.contains(&format!(r#"version="{VERSION}""#)));
        assert!(text.contains(&format!(r#"commit="{COMMIT}""#)));
        assert!(text.contains(&format!(r#"date="{BUILD_DATE}""#)));
    }

    #[test]
    fn test_counter_value_clamps_negative() {
        assert_eq!(counter_value(-1.0), 0);
        assert_eq!(counter_value(7.0), 7);
    }
}
