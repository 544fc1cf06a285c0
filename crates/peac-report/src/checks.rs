use serde::{Deserialize, Serialize};

/// The fixed, append-only check sequence (`spec.md` §4.9). Order is
/// significant: it is the order checks run and the order they appear in
/// every report, pass or fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    JwsParse,
    LimitsReceiptBytes,
    JwsProtectedHeader,
    ClaimsSchemaUnverified,
    IssuerTrustPolicy,
    IssuerDiscovery,
    KeyResolve,
    JwsSignature,
    ClaimsTimeWindow,
    ExtensionsLimits,
    TransportProfileBinding,
    PolicyBinding,
}

impl CheckName {
    /// The fixed order every report's `checks[]` follows.
    pub const ORDER: [CheckName; 12] = [
        CheckName::JwsParse,
        CheckName::LimitsReceiptBytes,
        CheckName::JwsProtectedHeader,
        CheckName::ClaimsSchemaUnverified,
        CheckName::IssuerTrustPolicy,
        CheckName::IssuerDiscovery,
        CheckName::KeyResolve,
        CheckName::JwsSignature,
        CheckName::ClaimsTimeWindow,
        CheckName::ExtensionsLimits,
        CheckName::TransportProfileBinding,
        CheckName::PolicyBinding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::JwsParse => "jws.parse",
            CheckName::LimitsReceiptBytes => "limits.receipt_bytes",
            CheckName::JwsProtectedHeader => "jws.protected_header",
            CheckName::ClaimsSchemaUnverified => "claims.schema_unverified",
            CheckName::IssuerTrustPolicy => "issuer.trust_policy",
            CheckName::IssuerDiscovery => "issuer.discovery",
            CheckName::KeyResolve => "key.resolve",
            CheckName::JwsSignature => "jws.signature",
            CheckName::ClaimsTimeWindow => "claims.time_window",
            CheckName::ExtensionsLimits => "extensions.limits",
            CheckName::TransportProfileBinding => "transport.profile_binding",
            CheckName::PolicyBinding => "policy.binding",
        }
    }
}

/// Outcome of a single check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skip,
}

/// One entry in a report's ordered `checks[]` list. `detail` is a
/// free-form, check-local explanation (e.g. the fixed string a `skip`
/// carries when a wire version has nothing to bind); the closed,
/// stable reason taxonomy lives only on [`crate::VerificationResult`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckEntry {
    pub name: CheckName,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
