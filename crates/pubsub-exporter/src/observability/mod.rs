//! Observability surface of the exporter.
//!
//! - `health` - `/healthz` and `/readyz` probes
//! - `metrics` - Prometheus text rendering of collector samples

pub mod health;
pub mod metrics;

pub use health::health_router;
pub use metrics::{build_info, PrometheusSink, BUILD_DATE, COMMIT, VERSION};
