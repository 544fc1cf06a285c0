use peac_crypto::Jwk;
use peac_fetch::FetchLimits;
use serde::{Deserialize, Serialize};

pub use crate::line_manifest::{DiscoveryManifest, PaymentRailEntry};

/// The JSON issuer configuration document, an alternative to the
/// line-oriented discovery dialect for issuers that expose a richer
/// `/.well-known/peac-configuration` endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonIssuerConfig {
    pub issuer: String,
    pub verify_endpoint: String,
    pub jwks_uri: String,
    #[serde(default)]
    pub payment_rails: Vec<PaymentRailEntry>,
}

/// How a verifier is expected to treat receipts for a given usage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageKind {
    Training,
    Inference,
    Indexing,
    Other,
}

/// Whether receipts are required, optional, or forbidden for a usage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReceiptsRequirement {
    Required,
    Optional,
    Forbidden,
}

/// A single usage-to-requirement rule from a policy manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub usage: UsageKind,
    pub receipts: ReceiptsRequirement,
}

/// A resource owner's policy manifest: what a given receipt usage
/// requires of a verifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyManifest {
    pub version: String,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

/// Whether key resolution may touch the network at all (`spec.md` §3.1).
/// This governs the verifier's offline/network boundary, not how
/// strictly a policy violation is enforced once a key has resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// A pinned raw key or JWK must resolve the `kid`; no fetch is ever
    /// attempted, even when one would be needed.
    OfflineOnly,
    /// A pinned key resolves offline when present; otherwise a live
    /// fetch is permitted.
    OfflinePreferred,
    /// A live discovery/JWKS fetch is permitted whenever no pinned raw
    /// key resolves the `kid` offline.
    NetworkAllowed,
}

impl Mode {
    /// Whether this mode permits a live discovery/JWKS fetch once no
    /// pinned raw key has resolved the `kid` offline (`spec.md` §4.7
    /// steps 2-3).
    pub fn permits_network_fetch(&self) -> bool {
        !matches!(self, Mode::OfflineOnly)
    }

    /// The stable wire string, e.g. `"offline_preferred"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::OfflineOnly => "offline_only",
            Mode::OfflinePreferred => "offline_preferred",
            Mode::NetworkAllowed => "network_allowed",
        }
    }
}

/// A pinned key that short-circuits JWKS resolution for a known issuer
/// (`spec.md` §4.7). Pinning the full JWK resolves without any network
/// access (`key_source = pinned`); pinning only a thumbprint still
/// requires a live fetch, which it then narrows and confirms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedKey {
    pub issuer: String,
    pub kid: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub thumbprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub jwk: Option<Jwk>,
}

/// Resource budget limits applied during discovery and key resolution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub max_discovery_bytes: usize,
    pub max_policy_bytes: usize,
    pub max_jwks_keys: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_discovery_bytes: 2000,
            max_policy_bytes: 2000,
            max_jwks_keys: 16,
        }
    }
}

/// Network-security configuration handed down to `peac-fetch` for every
/// outbound discovery and key-set request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkSecurityConfig {
    pub fetch_limits: FetchLimits,
}

impl Default for NetworkSecurityConfig {
    fn default() -> Self {
        Self {
            fetch_limits: FetchLimits::default(),
        }
    }
}

/// The full verifier-side trust policy: allow-listed issuers, pinned
/// keys, enforcement mode, and resource limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifierPolicy {
    pub allowed_issuers: Vec<String>,
    #[serde(default)]
    pub pinned_keys: Vec<PinnedKey>,
    pub mode: Mode,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub network: NetworkSecurityConfig,
}

impl Default for VerifierPolicy {
    fn default() -> Self {
        Self {
            allowed_issuers: Vec::new(),
            pinned_keys: Vec::new(),
            mode: Mode::OfflinePreferred,
            limits: Limits::default(),
            network: NetworkSecurityConfig::default(),
        }
    }
}

impl VerifierPolicy {
    /// A policy with the §6.4 recommended defaults and an empty
    /// issuer allow-list -- a collaborator adds issuers with
    /// [`Self::add_allowed_issuer`] before the policy accepts anything.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn add_allowed_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.allowed_issuers.push(issuer.into());
        self
    }

    pub fn add_pinned_key(mut self, pinned: PinnedKey) -> Self {
        self.pinned_keys.push(pinned);
        self
    }
}
