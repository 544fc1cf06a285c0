use serde::{Deserialize, Serialize};

/// How to treat a DNS resolution failure.
///
/// `Block` is fail-closed: the failure is reported as a blocked fetch
/// (mapped to `*_fetch_blocked` by the verifier). `Fail` reports it as a
/// plain network error instead, for callers that want to distinguish
/// "could not resolve" from "resolved to something unsafe".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnsFailureBehavior {
    Block,
    Fail,
}

impl Default for DnsFailureBehavior {
    fn default() -> Self {
        DnsFailureBehavior::Block
    }
}

/// Configurable fetch limits with the recommended defaults from
/// `spec.md` §6.4.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchLimits {
    pub max_bytes: usize,
    pub max_redirects: u32,
    pub fetch_timeout_ms: u64,
    pub allowed_ports: Vec<u16>,
    pub allow_cross_origin_redirects: bool,
    pub dns_failure_behavior: DnsFailureBehavior,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            max_bytes: 64 * 1024,
            max_redirects: 0,
            fetch_timeout_ms: 5_000,
            allowed_ports: vec![443],
            allow_cross_origin_redirects: false,
            dns_failure_behavior: DnsFailureBehavior::default(),
        }
    }
}

impl FetchLimits {
    /// The §6.4 recommended defaults.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn add_allowed_port(mut self, port: u16) -> Self {
        self.allowed_ports.push(port);
        self
    }
}
