//! # Exporter Test Utilities
//!
//! Shared test utilities for the Redis Pub/Sub exporter.
//!
//! This crate provides an in-memory store and fixtures for testing the
//! collector without a running Redis server.
//!
//! ## Modules
//!
//! - `mock_redis` - In-memory `PubSubStore` with failure and latency injection
//! - `fixtures` - `CLIENT LIST` and `INFO` reply builders
//!
//! ## Usage
//!
//! ```rust,ignore
//! use exporter_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let redis = MockRedis::new()
//!         .with_channel("orders.created", 2)
//!         .with_client_list(&client_list(&[
//!             ClientLine::new("10.0.0.1:5000").name("orders").sub(1),
//!         ]));
//!
//!     let collector = PubSubCollector::new(Arc::new(redis), 500, vec![], vec![]);
//!     let mut samples = Vec::new();
//!     collector.collect(&mut samples).await;
//! }
//! ```

pub mod fixtures;
pub mod mock_redis;

// Re-export commonly used items
pub use fixtures::*;
pub use mock_redis::*;
