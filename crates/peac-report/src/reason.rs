use serde::{Deserialize, Serialize};

/// The verifier's stable, closed severity set. `Ok` is the only `Info`
/// reason; every other reason is `Error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

/// The closed reason-code taxonomy (`spec.md` §7).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Ok,
    ReceiptTooLarge,
    MalformedReceipt,
    SignatureInvalid,
    IssuerNotAllowed,
    KeyNotFound,
    KeyFetchBlocked,
    KeyFetchFailed,
    KeyFetchTimeout,
    PointerFetchBlocked,
    PointerFetchFailed,
    PointerFetchTimeout,
    PointerFetchTooLarge,
    PointerDigestMismatch,
    JwksTooLarge,
    JwksTooManyKeys,
    Expired,
    NotYetValid,
    AudienceMismatch,
    SchemaInvalid,
    PolicyViolation,
    ExtensionTooLarge,
    InvalidTransport,
}

impl Reason {
    /// The full closed set, in taxonomy order.
    pub const ALL: [Reason; 23] = [
        Reason::Ok,
        Reason::ReceiptTooLarge,
        Reason::MalformedReceipt,
        Reason::SignatureInvalid,
        Reason::IssuerNotAllowed,
        Reason::KeyNotFound,
        Reason::KeyFetchBlocked,
        Reason::KeyFetchFailed,
        Reason::KeyFetchTimeout,
        Reason::PointerFetchBlocked,
        Reason::PointerFetchFailed,
        Reason::PointerFetchTimeout,
        Reason::PointerFetchTooLarge,
        Reason::PointerDigestMismatch,
        Reason::JwksTooLarge,
        Reason::JwksTooManyKeys,
        Reason::Expired,
        Reason::NotYetValid,
        Reason::AudienceMismatch,
        Reason::SchemaInvalid,
        Reason::PolicyViolation,
        Reason::ExtensionTooLarge,
        Reason::InvalidTransport,
    ];

    /// The stable wire string, e.g. `"key_fetch_blocked"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Ok => "ok",
            Reason::ReceiptTooLarge => "receipt_too_large",
            Reason::MalformedReceipt => "malformed_receipt",
            Reason::SignatureInvalid => "signature_invalid",
            Reason::IssuerNotAllowed => "issuer_not_allowed",
            Reason::KeyNotFound => "key_not_found",
            Reason::KeyFetchBlocked => "key_fetch_blocked",
            Reason::KeyFetchFailed => "key_fetch_failed",
            Reason::KeyFetchTimeout => "key_fetch_timeout",
            Reason::PointerFetchBlocked => "pointer_fetch_blocked",
            Reason::PointerFetchFailed => "pointer_fetch_failed",
            Reason::PointerFetchTimeout => "pointer_fetch_timeout",
            Reason::PointerFetchTooLarge => "pointer_fetch_too_large",
            Reason::PointerDigestMismatch => "pointer_digest_mismatch",
            Reason::JwksTooLarge => "jwks_too_large",
            Reason::JwksTooManyKeys => "jwks_too_many_keys",
            Reason::Expired => "expired",
            Reason::NotYetValid => "not_yet_valid",
            Reason::AudienceMismatch => "audience_mismatch",
            Reason::SchemaInvalid => "schema_invalid",
            Reason::PolicyViolation => "policy_violation",
            Reason::ExtensionTooLarge => "extension_too_large",
            Reason::InvalidTransport => "invalid_transport",
        }
    }

    /// The stable `E_VERIFY_*` error code used for logging and metrics.
    pub fn code(&self) -> String {
        format!("E_VERIFY_{}", self.as_str().to_uppercase())
    }

    pub fn severity(&self) -> Severity {
        match self {
            Reason::Ok => Severity::Info,
            _ => Severity::Error,
        }
    }
}
