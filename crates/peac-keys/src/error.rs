use thiserror::Error;

/// Key resolution failures (`spec.md` §4.7).
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key id '{0}' not found in issuer's key set")]
    KidNotFound(String),

    #[error("pinned thumbprint mismatch for kid '{0}'")]
    PinMismatch(String),

    #[error("key set fetch failed: {0}")]
    Fetch(#[from] peac_fetch::FetchError),

    #[error("key set is not valid JSON: {0}")]
    InvalidKeySet(String),

    #[error("key set exceeds the configured key count limit ({0})")]
    TooManyKeys(usize),

    #[error("key material rejected: {0}")]
    Crypto(#[from] peac_crypto::CryptoError),

    #[error("key resolution is in a negative-cache cooldown window")]
    NegativeCached,

    #[error("internal cache lock poisoned")]
    LockPoisoned,

    #[error("key set endpoint returned HTTP {0}")]
    HttpStatus(u16),

    #[error("key resolution requires a live fetch, but the policy mode forbids network access")]
    NetworkNotPermitted,

    #[error("fetched key set shares no thumbprint with the previously trusted set")]
    KeysetJump,
}
