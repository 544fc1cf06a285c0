use crate::error::TrustError;
use crate::types::VerifierPolicy;
use peac_crypto::Jwk;

/// Normalize an issuer origin for comparison: lowercase scheme and host,
/// drop a trailing slash, drop the default HTTPS port if explicit.
fn normalize_origin(issuer: &str) -> String {
    let trimmed = issuer.trim().trim_end_matches('/');
    let lower = trimmed.to_ascii_lowercase();
    lower.strip_suffix(":443").map(str::to_string).unwrap_or(lower)
}

/// Check whether an issuer is permitted under a verifier's trust policy.
/// Comparison is origin-normalized so `https://Api.Example.com/` and
/// `https://api.example.com` are treated as the same issuer.
pub fn check_issuer_allowed(policy: &VerifierPolicy, issuer: &str) -> Result<(), TrustError> {
    let candidate = normalize_origin(issuer);
    let allowed = policy
        .allowed_issuers
        .iter()
        .any(|allowed| normalize_origin(allowed) == candidate);
    if allowed {
        Ok(())
    } else {
        Err(TrustError::IssuerNotAllowed(issuer.to_string()))
    }
}

/// A pinned key resolution for one `(issuer, kid)` pair: either the raw
/// JWK itself, which resolves with no network access, or a thumbprint,
/// which only narrows and confirms a live fetch (`spec.md` §4.7).
#[derive(Clone, Copy, Debug)]
pub enum KeyPin<'a> {
    Raw(&'a Jwk),
    Thumbprint(&'a str),
}

/// Look up a pinned key for an issuer and key id, if one is configured.
/// A [`KeyPin::Raw`] hit lets the verifier skip JWKS resolution entirely;
/// a [`KeyPin::Thumbprint`] hit still requires a fetch (`spec.md` §4.7).
pub fn find_pinned_key<'a>(policy: &'a VerifierPolicy, issuer: &str, kid: &str) -> Option<KeyPin<'a>> {
    let candidate = normalize_origin(issuer);
    let pin = policy
        .pinned_keys
        .iter()
        .find(|pin| normalize_origin(&pin.issuer) == candidate && pin.kid == kid)?;
    if let Some(jwk) = &pin.jwk {
        Some(KeyPin::Raw(jwk))
    } else {
        pin.thumbprint.as_deref().map(KeyPin::Thumbprint)
    }
}
