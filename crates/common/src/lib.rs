//! Common utilities and types shared across the Redis Pub/Sub exporter crates.

#![warn(clippy::pedantic)]

/// Module for common error types
pub mod error;

/// Module for shared Redis connection settings
pub mod config;

/// Module for secret types that prevent accidental logging
pub mod secret;
