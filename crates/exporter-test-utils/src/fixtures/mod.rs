//! Reply fixtures for `CLIENT LIST` and `INFO`.
//!
//! # Example
//!
//! ```rust,ignore
//! use exporter_test_utils::fixtures::*;
//!
//! let raw = client_list(&[
//!     ClientLine::new("10.0.0.1:5000").name("orders").sub(3),
//!     ClientLine::new("10.0.0.2:5001").psub(1),
//! ]);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Builder for one `CLIENT LIST` line.
#[derive(Debug, Clone)]
pub struct ClientLine {
    id: u64,
    addr: Option<String>,
    name: String,
    sub: i64,
    psub: i64,
    cmd: String,
}

impl ClientLine {
    /// A connection at `addr` with no name and no subscriptions.
    pub fn new(addr: &str) -> Self {
        Self {
            id: NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed),
            addr: Some(addr.to_string()),
            name: String::new(),
            sub: 0,
            psub: 0,
            cmd: "ping".to_string(),
        }
    }

    /// A connection whose line carries no `addr` field.
    pub fn without_addr() -> Self {
        Self {
            addr: None,
            ..Self::new("")
        }
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    #[must_use]
    pub fn sub(mut self, count: i64) -> Self {
        self.sub = count;
        self.cmd = "subscribe".to_string();
        self
    }

    #[must_use]
    pub fn psub(mut self, count: i64) -> Self {
        self.psub = count;
        self.cmd = "psubscribe".to_string();
        self
    }

    /// Renders the line the way Redis 7 formats it.
    pub fn render(&self) -> String {
        let addr = self
            .addr
            .as_ref()
            .map(|a| format!("addr={a} "))
            .unwrap_or_default();
        let flags = if self.sub > 0 || self.psub > 0 { "P" } else { "N" };
        format!(
            "id={} {addr}laddr=127.0.0.1:6379 fd=8 name={} age=10 idle=0 flags={flags} db=0 \
             sub={} psub={} ssub=0 multi=-1 qbuf=0 qbuf-free=0 argv-mem=0 multi-mem=0 \
             obl=0 oll=0 omem=0 tot-mem=1800 events=r cmd={} user=default resp=2",
            self.id, self.name, self.sub, self.psub, self.cmd
        )
    }
}

/// Joins lines into a full `CLIENT LIST` reply.
pub fn client_list(lines: &[ClientLine]) -> String {
    let mut out = lines
        .iter()
        .map(ClientLine::render)
        .collect::<Vec<_>>()
        .join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// `INFO clients` reply.
pub fn info_clients(connected_clients: u64) -> String {
    format!(
        "# Clients\r\nconnected_clients:{connected_clients}\r\ncluster_connections:0\r\n\
         maxclients:10000\r\nblocked_clients:0\r\npubsub_clients:0\r\n"
    )
}

/// `INFO memory` reply.
pub fn info_memory(used_memory: u64) -> String {
    format!(
        "# Memory\r\nused_memory:{used_memory}\r\nused_memory_human:{}K\r\n\
         used_memory_rss:{used_memory}\r\nmem_allocator:jemalloc-5.3.0\r\n",
        used_memory / 1024
    )
}

/// Rows of `n` channels named `<prefix>.<i>`, each with `subscribers`.
pub fn numbered_channels(prefix: &str, n: usize, subscribers: i64) -> Vec<(String, i64)> {
    (0..n)
        .map(|i| (format!("{prefix}.{i}"), subscribers))
        .collect()
}
