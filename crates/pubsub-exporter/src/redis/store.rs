//! Store gateway used by the collector.

use crate::errors::ExporterError;
use crate::redis::info::InfoSections;
use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;

/// A pub/sub channel name exactly as Redis stores it.
///
/// Channel names are binary safe. The raw bytes are what `PUBSUB NUMSUB` is
/// asked about; labels use a lossy UTF-8 rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelName(Vec<u8>);

impl ChannelName {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The name as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Label value; invalid UTF-8 sequences become U+FFFD.
    pub fn to_label(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<Vec<u8>> for ChannelName {
    fn from(raw: Vec<u8>) -> Self {
        Self(raw)
    }
}

impl From<&[u8]> for ChannelName {
    fn from(raw: &[u8]) -> Self {
        Self(raw.to_vec())
    }
}

impl From<&str> for ChannelName {
    fn from(name: &str) -> Self {
        Self(name.as_bytes().to_vec())
    }
}

impl From<String> for ChannelName {
    fn from(name: String) -> Self {
        Self(name.into_bytes())
    }
}

impl PartialEq<str> for ChannelName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for ChannelName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_label())
    }
}

/// Read-only Redis operations issued during a scrape (enables mocking).
///
/// Every method is one round trip. Implementations must not retry; a failed
/// call is reported to the collector, which decides whether the scrape is
/// aborted or the item skipped.
#[async_trait]
pub trait PubSubStore: Send + Sync {
    /// `PING`.
    async fn ping(&self) -> Result<(), ExporterError>;

    /// `INFO <section>`, parsed into sections.
    async fn info(&self, section: &str) -> Result<InfoSections, ExporterError>;

    /// `PUBSUB CHANNELS <pattern>`, in server order.
    async fn pubsub_channels(&self, pattern: &str) -> Result<Vec<ChannelName>, ExporterError>;

    /// `PUBSUB NUMSUB <channel>...`, one `(channel, subscribers)` pair per
    /// requested channel, in request order.
    async fn pubsub_numsub(
        &self,
        channels: &[ChannelName],
    ) -> Result<Vec<(ChannelName, i64)>, ExporterError>;

    /// `PUBSUB NUMPAT`.
    async fn pubsub_numpat(&self) -> Result<i64, ExporterError>;

    /// `CLIENT LIST`, raw text.
    async fn client_list(&self) -> Result<String, ExporterError>;

    /// `HGETALL <key>`, as `(field, value)` pairs. A missing key yields no pairs.
    async fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, ExporterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_channel_name() {
        let name = ChannelName::from("orders.created");
        assert_eq!(name.as_str(), Some("orders.created"));
        assert_eq!(name.to_label(), "orders.created");
        assert_eq!(name, "orders.created");
    }

    #[test]
    fn test_non_utf8_channel_name_keeps_raw_bytes() {
        let name = ChannelName::from(vec![0xff, 0xfe, b'x']);
        assert_eq!(name.as_bytes(), &[0xff, 0xfe, b'x']);
        assert_eq!(name.as_str(), None);
        assert_eq!(name.to_label(), "\u{fffd}\u{fffd}x");
        assert_eq!(name.to_string(), "\u{fffd}\u{fffd}x");
    }
}
