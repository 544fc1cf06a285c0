use thiserror::Error;

/// A validation failure with field-level context, so issuance failures
/// surface precisely which input was rejected and why.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ClaimError {
    pub field: &'static str,
    pub message: String,
}

impl ClaimError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
