//! Redis access for the collector.
//!
//! This module provides:
//! - `PubSubStore` - the read-only command surface a scrape needs
//! - `ChannelName` - binary-safe channel name
//! - `RedisPubSubClient` - its implementation over a `ConnectionManager`
//! - `InfoSections` - parser for the sectioned `INFO` reply
//!
//! # Commands Issued Per Scrape
//!
//! - `PING`, `INFO clients`, `INFO memory`
//! - `PUBSUB CHANNELS *`, `PUBSUB NUMSUB ...`, `PUBSUB NUMPAT`
//! - `CLIENT LIST`
//! - `PUBSUB CHANNELS <pattern>` per probed pattern
//! - `HGETALL <key>` per hash metric definition

pub mod client;
pub mod info;
pub mod store;

pub use client::RedisPubSubClient;
pub use info::{InfoSection, InfoSections};
pub use store::{ChannelName, PubSubStore};
