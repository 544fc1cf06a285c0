use thiserror::Error;

/// Discovery and policy manifest parsing failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("manifest exceeds 20 lines")]
    TooManyLines,

    #[error("manifest exceeds 2000 bytes")]
    TooManyBytes,

    #[error("manifest exceeds 64 KB")]
    TooLarge,

    #[error("YAML anchors and aliases are not allowed")]
    AnchorsNotAllowed,

    #[error("merge keys ('<<') are not allowed")]
    MergeKeysNotAllowed,

    #[error("custom tags ('!...') are not allowed")]
    CustomTagsNotAllowed,

    #[error("multi-document streams are not allowed")]
    MultiDocumentNotAllowed,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("malformed line: '{0}'")]
    MalformedLine(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("unrecognized key '{0}'")]
    UnrecognizedKey(String),

    #[error("invalid value for '{0}': {1}")]
    InvalidValue(&'static str, String),
}

/// Issuer trust-policy failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrustError {
    #[error("issuer '{0}' is not on the allow-list")]
    IssuerNotAllowed(String),
}
