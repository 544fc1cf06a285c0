//! Issuer discovery documents, policy manifests, and trust-policy
//! evaluation (`spec.md` §4.5).
//!
//! Two independent restricted dialects are parsed here rather than one
//! overloaded grammar: the line-oriented discovery manifest
//! ([`parse_discovery_manifest`]) describes where an issuer's keys and
//! verify endpoint live, while the policy manifest
//! ([`parse_policy_manifest`]) describes what a resource owner requires
//! of a verifier for a given usage. They are published at different
//! endpoints, read by different callers, and evolve on different
//! schedules, so conflating their grammars would only make both harder
//! to validate.

#![deny(unsafe_code)]

mod error;
mod json_manifest;
mod line_manifest;
mod policy_manifest;
mod trust;
mod types;

pub use error::{DiscoveryError, TrustError};
pub use json_manifest::parse_json_issuer_config;
pub use line_manifest::parse_discovery_manifest;
pub use policy_manifest::parse_policy_manifest;
pub use trust::{check_issuer_allowed, find_pinned_key, KeyPin};
pub use types::{
    DiscoveryManifest, JsonIssuerConfig, Limits, Mode, NetworkSecurityConfig, PaymentRailEntry, PinnedKey,
    PolicyManifest, PolicyRule, ReceiptsRequirement, UsageKind, VerifierPolicy,
};
