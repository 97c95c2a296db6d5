//! Secret types for values that must never reach logs.
//!
//! The Redis password and any connection URL built from it are held as
//! [`SecretString`]. Its `Debug` output is redacted and the value is zeroized
//! on drop; reading it needs an explicit [`ExposeSecret::expose_secret`].
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! let url = SecretString::from("redis://:hunter2@cache:6379/0");
//! assert!(!format!("{url:?}").contains("hunter2"));
//! assert!(url.expose_secret().starts_with("redis://"));
//! ```

pub use secrecy::{ExposeSecret, SecretString};
