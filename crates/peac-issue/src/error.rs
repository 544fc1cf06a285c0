use peac_claims::ClaimError;
use peac_envelope::EnvelopeError;
use thiserror::Error;

/// Default cap on the serialised `ext` map (`spec.md` §6: `max_extension_bytes`).
pub const MAX_EXTENSION_BYTES: usize = 4 * 1024;

/// Issuance pipeline failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IssueError {
    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error("ext exceeds {max} bytes (got {actual})")]
    ExtensionTooLarge { max: usize, actual: usize },

    #[error("ext already defines reserved key '{0}'")]
    ReservedExtensionKey(&'static str),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}
