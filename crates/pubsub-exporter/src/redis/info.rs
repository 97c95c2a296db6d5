//! Parser for the sectioned `INFO` reply.
//!
//! ```text
//! # Clients
//! connected_clients:12
//! blocked_clients:0
//!
//! # Memory
//! used_memory:1048576
//! ```

use std::collections::HashMap;

/// Fields of one `INFO` section.
pub type InfoSection = HashMap<String, String>;

/// Section name used for fields that precede any `# Header` line.
pub const DEFAULT_SECTION: &str = "default";

/// `INFO` reply keyed by section name as the server spelled it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoSections {
    sections: HashMap<String, InfoSection>,
}

impl InfoSections {
    /// Parses raw `INFO` text.
    ///
    /// `# Name` opens a section; `key:value` lines (split on the first `:`)
    /// belong to the current section. Anything else is ignored.
    pub fn parse(raw: &str) -> Self {
        let mut sections: HashMap<String, InfoSection> = HashMap::new();
        let mut current = DEFAULT_SECTION.to_string();

        for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(header) = line.strip_prefix('#') {
                current = header.trim().to_string();
                sections.entry(current.clone()).or_default();
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                sections
                    .entry(current.clone())
                    .or_default()
                    .insert(key.to_string(), value.to_string());
            }
        }

        Self { sections }
    }

    /// Adds or replaces a whole section.
    pub fn insert(&mut self, name: impl Into<String>, section: InfoSection) {
        self.sections.insert(name.into(), section);
    }

    /// Looks up a section by name.
    ///
    /// Servers and client libraries disagree on casing (`Clients` vs
    /// `clients`), so an exact match is tried first, then an ASCII
    /// case-insensitive one.
    pub fn section(&self, name: &str) -> Option<&InfoSection> {
        self.sections.get(name).or_else(|| {
            self.sections
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, section)| section)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const CLIENTS_REPLY: &str = "# Clients\r\nconnected_clients:12\r\nblocked_clients:0\r\n\r\n";

    #[test]
    fn test_parse_sections_and_fields() {
        let info = InfoSections::parse(
            "# Clients\nconnected_clients:12\n\n# Memory\nused_memory:1048576\nused_memory_human:1.00M\n",
        );

        let clients = info.section("Clients").expect("clients section");
        assert_eq!(clients.get("connected_clients").unwrap(), "12");

        let memory = info.section("Memory").expect("memory section");
        assert_eq!(memory.get("used_memory").unwrap(), "1048576");
        assert_eq!(memory.get("used_memory_human").unwrap(), "1.00M");
    }

    #[test]
    fn test_crlf_line_endings() {
        let info = InfoSections::parse(CLIENTS_REPLY);
        let clients = info.section("Clients").unwrap();
        assert_eq!(clients.get("connected_clients").unwrap(), "12");
        assert_eq!(clients.get("blocked_clients").unwrap(), "0");
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let info = InfoSections::parse(CLIENTS_REPLY);
        assert!(info.section("clients").is_some());
        assert!(info.section("CLIENTS").is_some());
        assert!(info.section("memory").is_none());
    }

    #[test]
    fn test_exact_match_wins() {
        let mut info = InfoSections::default();
        info.insert(
            "Clients",
            InfoSection::from([("connected_clients".to_string(), "1".to_string())]),
        );
        info.insert(
            "clients",
            InfoSection::from([("connected_clients".to_string(), "2".to_string())]),
        );

        let section = info.section("clients").unwrap();
        assert_eq!(section.get("connected_clients").unwrap(), "2");
    }

    #[test]
    fn test_value_containing_colon() {
        let info = InfoSections::parse("# Server\nexecutable:/usr/bin/redis-server\nconfig:C:\\redis.conf");
        let server = info.section("server").unwrap();
        assert_eq!(server.get("config").unwrap(), "C:\\redis.conf");
    }

    #[test]
    fn test_fields_without_header_use_default_section() {
        let info = InfoSections::parse("connected_clients:3\ngarbage line");
        let section = info.section(DEFAULT_SECTION).unwrap();
        assert_eq!(section.len(), 1);
    }

    #[test]
    fn test_empty_section_is_present() {
        let info = InfoSections::parse("# Keyspace\n");
        assert!(info.section("keyspace").unwrap().is_empty());
    }
}
