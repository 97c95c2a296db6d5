//! Shared Redis connection settings.

use crate::error::{CommonError, Result};
use crate::secret::{ExposeSecret, SecretString};
use url::Url;

/// Default Redis host.
pub const DEFAULT_REDIS_HOST: &str = "localhost";

/// Default Redis port.
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Redis connection settings.
///
/// The password is held in a `SecretString`, so the derived `Debug`
/// output never contains it.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Server hostname or IP address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Optional `AUTH` password. An empty value is treated as no password.
    pub password: Option<SecretString>,
    /// Logical database number.
    pub db: i64,
    /// Connect with TLS (`rediss://`).
    pub tls: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_REDIS_HOST.to_string(),
            port: DEFAULT_REDIS_PORT,
            password: None,
            db: 0,
            tls: false,
        }
    }
}

impl RedisConfig {
    /// Returns `host:port`, safe to log.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the connection URL understood by the `redis` crate.
    ///
    /// The password is percent-encoded into the userinfo part, so the
    /// returned URL is wrapped in a `SecretString`.
    ///
    /// # Errors
    ///
    /// Returns `CommonError::Configuration` if the host cannot form a valid URL.
    pub fn url(&self) -> Result<SecretString> {
        let scheme = if self.tls { "rediss" } else { "redis" };
        let mut url = Url::parse(&format!(
            "{scheme}://{}:{}/{}",
            self.host, self.port, self.db
        ))
        .map_err(|e| CommonError::Configuration(format!("invalid Redis address: {e}")))?;

        if let Some(password) = &self.password {
            url.set_password(Some(password.expose_secret()))
                .map_err(|()| {
                    CommonError::Configuration("Redis URL cannot carry a password".to_string())
                })?;
        }

        Ok(SecretString::from(url.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url() {
        let config = RedisConfig::default();
        let url = config.url().expect("default config should build a URL");
        assert_eq!(url.expose_secret(), "redis://localhost:6379/0");
        assert_eq!(config.address(), "localhost:6379");
    }

    #[test]
    fn test_tls_uses_rediss_scheme() {
        let config = RedisConfig {
            host: "cache.internal".to_string(),
            port: 6380,
            db: 2,
            tls: true,
            ..RedisConfig::default()
        };
        let url = config.url().unwrap();
        assert_eq!(url.expose_secret(), "rediss://cache.internal:6380/2");
    }

    #[test]
    fn test_password_is_percent_encoded() {
        let config = RedisConfig {
            password: Some(SecretString::from("p@ss:w/rd")),
            ..RedisConfig::default()
        };
        let url = config.url().unwrap();
        assert_eq!(
            url.expose_secret(),
            "redis://:p%40ss%3Aw%2Frd@localhost:6379/0"
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let config = RedisConfig {
            password: Some(SecretString::from("hunter2")),
            ..RedisConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("localhost"));
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let config = RedisConfig {
            host: "bad host".to_string(),
            ..RedisConfig::default()
        };
        assert!(matches!(config.url(), Err(CommonError::Configuration(_))));
    }
}
