use serde::{Deserialize, Serialize};

/// Where the verifying key came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    Pinned,
    JwksFetch,
}

/// Pointer-fetch artifact: the URL a receipt referenced, the digest it
/// claimed, the digest actually observed, and whether they matched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptPointer {
    pub url: String,
    pub expected_digest: String,
    pub actual_digest: String,
    pub matched: bool,
}

/// All optional report artifacts, partitioned into deterministic and
/// non-deterministic groups (`spec.md` §4.10).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_key_source: Option<KeySource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_key_thumbprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_claims_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_pointer: Option<ReceiptPointer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_jwks_digest: Option<String>,
}

impl Artifacts {
    pub fn is_empty(&self) -> bool {
        self.issuer_key_source.is_none()
            && self.issuer_key_thumbprint.is_none()
            && self.normalized_claims_digest.is_none()
            && self.receipt_pointer.is_none()
            && self.issuer_jwks_digest.is_none()
    }

    /// Drop the single non-deterministic artifact key (`issuer_jwks_digest`),
    /// used by [`crate::ReportBuilder::build_deterministic`].
    pub(crate) fn without_non_deterministic(&self) -> Self {
        Self {
            issuer_jwks_digest: None,
            ..self.clone()
        }
    }
}
