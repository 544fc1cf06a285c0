//! Receipt claim schema and input validators (`spec.md` §4.4).
//!
//! Types here describe both the raw, unvalidated issuance input
//! ([`ClaimInput`]) and the fully assembled signed payload
//! ([`ReceiptClaims`]). Validators are free functions composed by
//! [`validate_claim_input`]; each failure carries the offending field name.

#![deny(unsafe_code)]

mod error;
mod types;
mod validators;

pub use error::ClaimError;
pub use types::*;
pub use validators::*;

/// Serialised byte size of an `ext` map, used by both issuance (to reject
/// oversized extensions before signing) and verification (the
/// `extensions.limits` check).
pub fn ext_byte_size(ext: &std::collections::BTreeMap<String, serde_json::Value>) -> usize {
    serde_json::to_vec(ext).map(|v| v.len()).unwrap_or(usize::MAX)
}
