use serde::{Deserialize, Serialize};

/// Host-environment DNS capability, probed once and then treated as an
/// explicit value the fetch function branches on (`spec.md` §9,
/// "Capability-aware SSRF").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeCapability {
    /// The engine can pre-resolve hostnames to IP literals and reject
    /// results in reserved address space itself.
    FullDnsPreresolution,
    /// DNS pre-resolution is unreliable; fall back to URL-level checks
    /// and rely on host/network-level isolation.
    Partial,
    /// No pre-resolution attempted at all.
    Minimal,
}

impl RuntimeCapability {
    /// Probe the host environment. A successful loopback resolution
    /// indicates the standard library's resolver is usable for
    /// pre-resolution; any failure falls back to `Minimal` rather than
    /// guessing at a reduced guarantee.
    pub fn probe() -> Self {
        use std::net::ToSocketAddrs;
        match "localhost:443".to_socket_addrs() {
            Ok(mut addrs) if addrs.next().is_some() => RuntimeCapability::FullDnsPreresolution,
            _ => RuntimeCapability::Minimal,
        }
    }
}
