use peac_crypto::{Jwk, PublicKey};
use serde::{Deserialize, Serialize};

/// A JSON key set as published at an issuer's `jwks_uri`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// A resolved, verified key ready for signature checking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedKey {
    pub kid: String,
    pub public_key: PublicKey,
    pub thumbprint: String,
}

/// Where a resolved key came from (`spec.md` §4.10's `issuer_key_source`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySource {
    Pinned,
    JwksFetch,
}

/// A pin handed to the resolver for one `(issuer, kid)` pair: either a
/// raw JWK, which resolves with no network access, or a thumbprint,
/// which only narrows and confirms a live fetch (`spec.md` §4.7).
#[derive(Clone, Debug)]
pub enum KeyPin {
    Raw(Jwk),
    Thumbprint(String),
}

/// Cache behaviour tuning for JWKS resolution.
#[derive(Clone, Copy, Debug)]
pub struct CacheConfig {
    pub positive_ttl_secs: u64,
    pub negative_ttl_secs: u64,
    pub negative_ttl_jitter_secs: u64,
    /// Maximum number of issuer-origin key sets held in each of the
    /// positive and negative caches before the least-recently-used
    /// entry is evicted (`spec.md` §4.7).
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            positive_ttl_secs: 300,
            negative_ttl_secs: 300,
            negative_ttl_jitter_secs: 300,
            max_entries: 1000,
        }
    }
}
