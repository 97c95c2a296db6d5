//! Pub/sub collector.
//!
//! This module provides:
//! - `PubSubCollector` - runs one scrape against a `PubSubStore`
//! - `parse_client_list` - extracts subscribed clients from `CLIENT LIST`
//! - `discover_patterns` - derives `<prefix>.*` patterns from channel names
//! - `read_hash_metrics` - turns configured Redis hashes into gauges
//!
//! # Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `redis_pubsub_channels_total` | Gauge | none |
//! | `redis_pubsub_channel_subscriber_count` | Gauge | `channel` |
//! | `redis_pubsub_orphan_channels_total` | Gauge | none |
//! | `redis_pubsub_patterns_total` | Gauge | none |
//! | `redis_pubsub_pattern_subscriber_count` | Gauge | `pattern` |
//! | `redis_pubsub_clients_total` | Gauge | none |
//! | `redis_pubsub_client_channel_subscriptions` | Gauge | `client_name`, `client_addr` |
//! | `redis_pubsub_client_pattern_subscriptions` | Gauge | `client_name`, `client_addr` |
//! | `redis_pubsub_exporter_redis_up` | Gauge | none |
//! | `redis_pubsub_exporter_redis_connected_clients` | Gauge | none |
//! | `redis_pubsub_exporter_redis_used_memory_bytes` | Gauge | none |
//! | `redis_pubsub_exporter_scrape_duration_seconds` | Gauge | none |
//! | `redis_pubsub_exporter_scrape_errors_total` | Counter | none |
//! | `redis_pubsub_<name>` | Gauge | configured field label |

pub mod client_list;
pub mod hash_metrics;
pub mod orchestrator;
pub mod patterns;
pub mod sample;

pub use client_list::{parse_client_list, PubSubClient};
pub use hash_metrics::{hash_samples, read_hash_metrics};
pub use orchestrator::{PubSubCollector, ScrapeOutcome, SCRAPE_TIMEOUT};
pub use patterns::discover_patterns;
pub use sample::{Descriptor, MetricSink, Sample, SampleKind};
