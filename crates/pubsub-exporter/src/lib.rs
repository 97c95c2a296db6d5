//! Redis Pub/Sub Prometheus Exporter Library
//!
//! Exposes the pub/sub topology of a Redis server as Prometheus metrics:
//!
//! - Active channels and their direct subscriber counts
//! - Orphan channels (no direct subscribers)
//! - Pattern subscriptions and per-pattern channel activity
//! - Per-client channel and pattern subscription counts
//! - Operator-defined gauges backed by Redis hashes
//!
//! # Architecture
//!
//! Nothing runs in the background. Each Prometheus scrape of `/metrics`
//! triggers exactly one [`collector::PubSubCollector::collect`], which queries
//! Redis through the [`redis::PubSubStore`] trait and writes samples to a
//! fresh [`observability::PrometheusSink`].
//!
//! ```text
//! GET /metrics
//! └── PubSubCollector::collect (exclusive, 10s budget)
//!     ├── PING, INFO
//!     ├── PUBSUB CHANNELS / NUMSUB / NUMPAT
//!     ├── CLIENT LIST -> parse_client_list
//!     ├── discover_patterns -> PUBSUB CHANNELS <pattern>
//!     └── read_hash_metrics -> HGETALL <key>
//! ```
//!
//! # Modules
//!
//! - [`collector`] - Scrape orchestration and sample production
//! - [`config`] - Service configuration from environment
//! - [`errors`] - Error types
//! - [`observability`] - Health probes and Prometheus rendering
//! - [`redis`] - Store trait and its Redis implementation
//! - [`routes`] - Axum router

pub mod collector;
pub mod config;
pub mod errors;
pub mod observability;
pub mod redis;
pub mod routes;
