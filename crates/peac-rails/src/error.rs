/// The closed error-kind set for adapter failures (`spec.md` §4.11).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdapterErrorKind {
    MissingRequiredField,
    ValidationError,
    InvalidFormat,
}

impl AdapterErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterErrorKind::MissingRequiredField => "missing_required_field",
            AdapterErrorKind::ValidationError => "validation_error",
            AdapterErrorKind::InvalidFormat => "invalid_format",
        }
    }
}

/// An adapter failure: a kind from the closed set, the offending field
/// name, and a short human string. Adapters return this, they never
/// panic (`spec.md` §4.11, "adapters must be total").
#[derive(Debug, PartialEq, Eq)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.kind.as_str(), self.field, self.message)
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    pub fn missing(field: &'static str) -> Self {
        Self {
            kind: AdapterErrorKind::MissingRequiredField,
            field,
            message: format!("'{field}' is required"),
        }
    }

    pub fn invalid_format(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: AdapterErrorKind::InvalidFormat,
            field,
            message: message.into(),
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: AdapterErrorKind::ValidationError,
            field,
            message: message.into(),
        }
    }
}
