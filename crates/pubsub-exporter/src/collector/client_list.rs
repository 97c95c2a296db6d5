//! `CLIENT LIST` parsing.
//!
//! `CLIENT LIST` returns one line per connection:
//!
//! ```text
//! id=123 addr=127.0.0.1:54321 fd=8 name=myapp age=10 idle=0 flags=P db=0 sub=2 psub=1 ...
//! ```
//!
//! Only connections holding at least one channel or pattern subscription are
//! kept.

use std::collections::HashMap;

/// Label used when a connection has no `CLIENT SETNAME`.
pub const UNNAMED_CLIENT: &str = "unnamed";

/// Label used when a record carries no `addr` field.
pub const UNKNOWN_ADDR: &str = "unknown";

/// A Redis connection with pub/sub subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubClient {
    /// Client address (ip:port).
    pub addr: String,
    /// Client name from `CLIENT SETNAME`.
    pub name: String,
    /// Channel subscriptions (`SUBSCRIBE`).
    pub sub: i64,
    /// Pattern subscriptions (`PSUBSCRIBE`).
    pub psub: i64,
}

/// One tokenized `CLIENT LIST` line.
struct ClientRecord<'a> {
    fields: HashMap<&'a str, &'a str>,
}

impl<'a> ClientRecord<'a> {
    /// Splits on single spaces, then each token on its first `=`.
    /// Tokens without `=` are dropped.
    fn tokenize(line: &'a str) -> Self {
        let fields = line
            .split(' ')
            .filter_map(|token| token.split_once('='))
            .collect();
        Self { fields }
    }

    /// Non-empty string field.
    fn text(&self, key: &str) -> Option<&'a str> {
        self.fields.get(key).copied().filter(|v| !v.is_empty())
    }

    /// Integer field; absent or malformed reads as 0.
    fn int(&self, key: &str) -> i64 {
        self.fields
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

/// Parses `CLIENT LIST` output into clients with active subscriptions,
/// preserving input order.
pub fn parse_client_list(raw: &str) -> Vec<PubSubClient> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let record = ClientRecord::tokenize(line);
            let sub = record.int("sub");
            let psub = record.int("psub");
            if sub == 0 && psub == 0 {
                return None;
            }

            Some(PubSubClient {
                addr: record.text("addr").unwrap_or(UNKNOWN_ADDR).to_string(),
                name: record.text("name").unwrap_or(UNNAMED_CLIENT).to_string(),
                sub,
                psub,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn assert_client(got: &PubSubClient, name: &str, addr: &str, sub: i64, psub: i64) {
        assert_eq!(got.name, name, "name");
        assert_eq!(got.addr, addr, "addr");
        assert_eq!(got.sub, sub, "sub");
        assert_eq!(got.psub, psub, "psub");
    }

    #[test]
    fn test_mixed_client_types() {
        let input = "id=1 addr=10.0.0.1:12345 fd=5 name=orders-service age=100 idle=0 flags=S db=0 sub=3 psub=0 multi=-1 qbuf=0 obl=0 oll=0 events=r cmd=subscribe\n\
                     id=2 addr=10.0.0.2:12346 fd=6 name=user-service age=200 idle=0 flags=S db=0 sub=0 psub=2 multi=-1 qbuf=0 obl=0 oll=0 events=r cmd=psubscribe\n\
                     id=3 addr=10.0.0.3:12347 fd=7 name=web-app age=300 idle=10 flags=N db=0 sub=0 psub=0 multi=-1 qbuf=0 obl=0 oll=0 events=r cmd=get";

        let clients = parse_client_list(input);

        assert_eq!(clients.len(), 2);
        assert_client(&clients[0], "orders-service", "10.0.0.1:12345", 3, 0);
        assert_client(&clients[1], "user-service", "10.0.0.2:12346", 0, 2);
    }

    #[test]
    fn test_empty_name_gets_unnamed_label() {
        let clients = parse_client_list(
            "id=10 addr=10.0.0.5:9999 fd=8 name= age=50 idle=0 flags=S db=0 sub=1 psub=0",
        );
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].name, UNNAMED_CLIENT);
    }

    #[test]
    fn test_absent_name_gets_unnamed_label() {
        let clients = parse_client_list("id=10 addr=10.0.0.5:9999 sub=1");
        assert_eq!(clients[0].name, UNNAMED_CLIENT);
    }

    #[test]
    fn test_mixed_subscribe_and_psubscribe() {
        let clients = parse_client_list(
            "id=20 addr=10.0.0.10:4444 fd=9 name=mixed-client sub=2 psub=3 cmd=subscribe",
        );
        assert_client(&clients[0], "mixed-client", "10.0.0.10:4444", 2, 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_client_list("").is_empty());
        assert!(parse_client_list("\n\n   \n").is_empty());
    }

    #[test]
    fn test_zero_subscriptions_are_filtered_out() {
        let input = "id=1 addr=10.0.0.1:1111 name=app1 sub=0 psub=0 cmd=get\n\
                     id=2 addr=10.0.0.2:2222 name=app2 sub=0 psub=0 cmd=set";
        assert!(parse_client_list(input).is_empty());
    }

    #[test]
    fn test_missing_or_malformed_counts_read_as_zero() {
        let input = "id=1 addr=10.0.0.1:1111 name=nosub\n\
                     id=2 addr=10.0.0.2:2222 name=bad sub=many psub=x";
        assert!(parse_client_list(input).is_empty());
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let clients = parse_client_list(
            "garbage data without equals signs\nid=1 addr=10.0.0.1:1234 name=valid sub=1 psub=0",
        );
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].name, "valid");
    }

    #[test]
    fn test_missing_addr_defaults_to_unknown() {
        let clients = parse_client_list("id=1 name=noaddr sub=5 psub=0");
        assert_eq!(clients[0].addr, UNKNOWN_ADDR);
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let input = "\n  id=1 addr=10.0.0.1:5555 name=trimmed sub=2 psub=1  \n\n  id=2 addr=10.0.0.2:6666 name=trimmed2 sub=0 psub=0  \n";
        let clients = parse_client_list(input);
        assert_eq!(clients.len(), 1);
        assert_client(&clients[0], "trimmed", "10.0.0.1:5555", 2, 1);
    }

    #[test]
    fn test_crlf_line_endings() {
        let clients = parse_client_list("id=1 addr=a:1 name=x sub=1 psub=0\r\nid=2 addr=b:2 name=y sub=0 psub=4\r\n");
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[1].psub, 4);
    }

    #[test]
    fn test_value_containing_equals_sign() {
        let clients = parse_client_list("id=1 addr=10.0.0.1:1234 name=app=v2 sub=1 psub=0");
        assert_eq!(clients[0].name, "app=v2");
    }

    #[test]
    fn test_large_counts() {
        let clients = parse_client_list("id=1 addr=10.0.0.1:1234 name=heavy sub=9999 psub=500");
        assert_client(&clients[0], "heavy", "10.0.0.1:1234", 9999, 500);
    }

    #[test]
    fn test_preserves_input_order() {
        let input = (0..20)
            .map(|i| format!("id={i} addr=10.0.0.1:{i} name=client-{i} sub=1 psub=0"))
            .collect::<Vec<_>>()
            .join("\n");

        let names: Vec<String> = parse_client_list(&input)
            .into_iter()
            .map(|c| c.name)
            .collect();
        let expected: Vec<String> = (0..20).map(|i| format!("client-{i}")).collect();
        assert_eq!(names, expected);
    }
}
