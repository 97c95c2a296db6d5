//! Exporter error types.
//!
//! Every error that reaches the collector aborts the current scrape; none of
//! them is retried inside a scrape. The next Prometheus scrape is the retry.

use std::time::Duration;
use thiserror::Error;

/// Exporter error type.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Redis command or transport failure.
    #[error("Redis error: {0}")]
    Redis(String),

    /// The scrape did not finish within its time budget.
    #[error("Scrape timed out after {0:?}")]
    Timeout(Duration),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExporterError {
    /// Returns a short, bounded label describing the error class.
    ///
    /// Used as a structured log field; never contains Redis output.
    pub fn kind(&self) -> &'static str {
        match self {
            ExporterError::Redis(_) => "redis",
            ExporterError::Timeout(_) => "timeout",
            ExporterError::Config(_) => "config",
        }
    }
}

impl From<common::error::CommonError> for ExporterError {
    fn from(err: common::error::CommonError) -> Self {
        ExporterError::Config(err.to_string())
    }
}
