//! JWKS resolution, pinned-key (TOFU) lookup, and key caching
//! (`spec.md` §4.7).
//!
//! Positive results are cached for a TTL; failures are negative-cached
//! with jittered backoff so a misconfigured or down issuer doesn't turn
//! every verification into a fresh network round trip. Concurrent
//! lookups for the same `(jwks_uri, kid)` share one fetch via
//! singleflight.

#![deny(unsafe_code)]

mod cache;
mod error;
mod resolver;
mod types;

pub use error::KeyError;
pub use resolver::{KeyResolver, Resolution};
pub use types::{CacheConfig, JwkSet, KeyPin, KeySource, ResolvedKey};
