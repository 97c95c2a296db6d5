//! Exporter configuration.
//!
//! Every setting is a command-line flag backed by an environment variable
//! (`--redis.host` / `REDIS_HOST`, ...). A flag wins over its variable. The
//! Redis password is held in a `SecretString` and never appears in Debug
//! output.

use crate::collector::sample::{BUILTIN_METRICS, NAMESPACE};
use common::config::{RedisConfig, DEFAULT_REDIS_HOST, DEFAULT_REDIS_PORT};
use clap::Parser;
use common::secret::SecretString;
use std::collections::HashMap;
use thiserror::Error;

/// Default HTTP bind address for `/metrics` and the health endpoints.
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9123";

/// Default cap on the number of channels tracked per scrape.
pub const DEFAULT_MAX_CHANNELS: usize = 500;

/// A Redis hash exposed as a Prometheus gauge.
///
/// Each hash field becomes a label value under `field_label`; the numeric
/// field value becomes the gauge value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashMetricDef {
    /// Redis hash key read with `HGETALL`.
    pub redis_key: String,
    /// Metric name; the collector adds the namespace prefix.
    pub metric_name: String,
    /// Metric HELP text.
    pub help: String,
    /// Label name carrying the hash field.
    pub field_label: String,
}

/// Exporter configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection settings.
    pub redis: RedisConfig,

    /// HTTP bind address (default: "0.0.0.0:9123").
    pub listen_address: String,

    /// Maximum number of channels reported per scrape (high cardinality guard).
    pub max_channels: usize,

    /// Operator-supplied patterns probed on every scrape.
    pub known_patterns: Vec<String>,

    /// Hash-backed gauges, in configuration order.
    pub hash_metrics: Vec<HashMetricDef>,
}

/// Command-line flags.
///
/// Values stay raw strings; [`Config::from_vars`] applies defaults and
/// parsing so a flag and its environment variable behave identically.
#[derive(Debug, Default, Parser)]
#[command(
    name = "pubsub-exporter",
    version,
    about = "Prometheus exporter for Redis Pub/Sub channels, patterns, and client subscriptions."
)]
pub struct Args {
    /// Redis server hostname [default: localhost]
    #[arg(long = "redis.host", env = "REDIS_HOST")]
    pub redis_host: Option<String>,

    /// Redis server port [default: 6379]
    #[arg(long = "redis.port", env = "REDIS_PORT")]
    pub redis_port: Option<String>,

    /// Redis server password
    #[arg(long = "redis.password", env = "REDIS_PASSWORD", hide_env_values = true)]
    pub redis_password: Option<String>,

    /// Redis database number [default: 0]
    #[arg(long = "redis.db", env = "REDIS_DB")]
    pub redis_db: Option<String>,

    /// Enable TLS for the Redis connection
    #[arg(
        long = "redis.tls",
        env = "REDIS_TLS",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub redis_tls: Option<String>,

    /// Address to listen on for metrics (e.g. :9123 or 0.0.0.0:9123)
    #[arg(long = "web.listen-address", env = "EXPORTER_LISTEN_ADDRESS")]
    pub listen_address: Option<String>,

    /// Listen on 0.0.0.0:<port>; overrides --web.listen-address
    #[arg(long = "web.port", env = "EXPORTER_PORT")]
    pub port: Option<String>,

    /// Maximum number of channels to track (high cardinality guard) [default: 500]
    #[arg(long = "max-channels", env = "MAX_CHANNELS")]
    pub max_channels: Option<String>,

    /// Comma-separated patterns probed on every scrape
    #[arg(long = "known-patterns", env = "KNOWN_PATTERNS")]
    pub known_patterns: Option<String>,

    /// Hash-backed gauges: redis_key=...,metric=...,help=...,label=...;...
    #[arg(long = "hash-metrics", env = "HASH_METRICS")]
    pub hash_metrics: Option<String>,
}

impl Args {
    /// Supplied values keyed by their environment variable names.
    pub fn into_vars(self) -> HashMap<String, String> {
        [
            ("REDIS_HOST", self.redis_host),
            ("REDIS_PORT", self.redis_port),
            ("REDIS_PASSWORD", self.redis_password),
            ("REDIS_DB", self.redis_db),
            ("REDIS_TLS", self.redis_tls),
            ("EXPORTER_LISTEN_ADDRESS", self.listen_address),
            ("EXPORTER_PORT", self.port),
            ("MAX_CHANNELS", self.max_channels),
            ("KNOWN_PATTERNS", self.known_patterns),
            ("HASH_METRICS", self.hash_metrics),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from parsed command-line flags.
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        Self::from_vars(&args.into_vars())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).filter(|v| !v.is_empty());

        let host = get("REDIS_HOST")
            .cloned()
            .unwrap_or_else(|| DEFAULT_REDIS_HOST.to_string());

        let port = get("REDIS_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_REDIS_PORT);

        let db = get("REDIS_DB").and_then(|s| s.parse().ok()).unwrap_or(0);

        let tls = get("REDIS_TLS").and_then(|s| parse_bool(s)).unwrap_or(false);

        // Empty password string is treated as no password
        let password = get("REDIS_PASSWORD").map(|pw| SecretString::from(pw.clone()));

        let mut listen_address = get("EXPORTER_LISTEN_ADDRESS")
            .map_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string(), |addr| expand_listen_address(addr));

        // EXPORTER_PORT overrides the listen address if set
        if let Some(port) = get("EXPORTER_PORT") {
            listen_address = format!("0.0.0.0:{port}");
        }

        let max_channels = get("MAX_CHANNELS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_CHANNELS);
        if max_channels == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_CHANNELS must be greater than zero".to_string(),
            ));
        }

        let known_patterns = get("KNOWN_PATTERNS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let hash_metrics = match get("HASH_METRICS") {
            Some(raw) => parse_hash_metrics(raw)?,
            None => Vec::new(),
        };

        Ok(Config {
            redis: RedisConfig {
                host,
                port,
                password,
                db,
                tls,
            },
            listen_address,
            max_channels,
            known_patterns,
            hash_metrics,
        })
    }
}

/// Parses a `HASH_METRICS` string into hash metric definitions.
///
/// Definitions are separated by `;`, their `key=value` pairs by `,`.
/// Recognized keys: `redis_key`, `metric`, `help`, `label`. Whitespace around
/// keys and values is trimmed and empty definitions are ignored.
///
/// ```text
/// redis_key=myapp:stats,metric=active_count,help=Active items,label=item
/// ```
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if any definition lacks `redis_key`,
/// `metric` or `label`, if `metric` or `label` is not a valid Prometheus
/// name, or if the namespaced metric would collide with a built-in metric.
/// No definitions are returned in that case.
pub fn parse_hash_metrics(raw: &str) -> Result<Vec<HashMetricDef>, ConfigError> {
    let mut defs = Vec::new();

    for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let fields: HashMap<&str, &str> = segment
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.trim(), v.trim()))
            .collect();

        let field = |key: &str| {
            fields
                .get(key)
                .copied()
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let (Some(redis_key), Some(metric_name), Some(field_label)) =
            (field("redis_key"), field("metric"), field("label"))
        else {
            return Err(ConfigError::InvalidValue(format!(
                "hash metric definition missing required field (redis_key, metric, label): {segment:?}"
            )));
        };

        validate_metric_name(&metric_name)?;
        validate_label_name(&field_label)?;

        let help = field("help").unwrap_or_else(|| format!("Value from hash {redis_key}"));

        defs.push(HashMetricDef {
            redis_key,
            metric_name,
            help,
            field_label,
        });
    }

    Ok(defs)
}

/// `metric` must match `[a-zA-Z_:][a-zA-Z0-9_:]*` and must not shadow a
/// built-in metric once namespaced.
fn validate_metric_name(metric: &str) -> Result<(), ConfigError> {
    let mut chars = metric.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
    if !valid {
        return Err(ConfigError::InvalidValue(format!(
            "hash metric name is not a valid Prometheus metric name: {metric:?}"
        )));
    }

    let full_name = format!("{NAMESPACE}_{metric}");
    if BUILTIN_METRICS.iter().any(|d| d.name == full_name) {
        return Err(ConfigError::InvalidValue(format!(
            "hash metric {full_name} collides with a built-in metric"
        )));
    }

    Ok(())
}

/// Label names match `[a-zA-Z_][a-zA-Z0-9_]*`; `__` is reserved.
fn validate_label_name(label: &str) -> Result<(), ConfigError> {
    let mut chars = label.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !label.starts_with("__");
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "hash metric label is not a valid Prometheus label name: {label:?}"
        )))
    }
}

/// Accepts Go-style `:9123` bind addresses.
fn expand_listen_address(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
