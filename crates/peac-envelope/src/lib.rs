//! Compact three-segment envelope: `base64url(header) "." base64url(payload)
//! "." base64url(signature)`.
//!
//! Header and payload JSON are always the canonical form of their values
//! (see `peac-canon`). Decoding without verifying is a distinct, cheaper
//! operation from full decode-and-verify so callers can inspect the
//! protected header (to pick a key) before paying for signature
//! verification.

#![deny(unsafe_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use peac_crypto::{CryptoError, Keypair, PublicKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current wire version. Embedded in the header's `typ` field as
/// `peac-receipt/<WIRE_VERSION>`.
pub const WIRE_VERSION: &str = "01";

/// Envelope header. Fixed shape per the wire format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    pub typ: String,
    pub kid: String,
}

impl Header {
    /// Build a header for the current wire version with the given key id.
    pub fn new(kid: impl Into<String>) -> Self {
        Self {
            alg: "EdDSA".to_string(),
            typ: format!("peac-receipt/{WIRE_VERSION}"),
            kid: kid.into(),
        }
    }

    fn expected_typ() -> String {
        format!("peac-receipt/{WIRE_VERSION}")
    }
}

/// Envelope failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("receipt exceeds maximum size of {max} bytes (got {actual})")]
    TooLarge { max: usize, actual: usize },

    #[error("malformed receipt: expected 3 dot-separated segments, got {0}")]
    MalformedSegments(usize),

    #[error("malformed receipt: invalid base64url in segment '{0}'")]
    InvalidBase64(&'static str),

    #[error("malformed receipt: segment '{0}' is not valid JSON")]
    InvalidJson(&'static str),

    #[error("unsupported algorithm '{0}', expected EdDSA")]
    UnsupportedAlgorithm(String),

    #[error("unsupported wire type '{0}', expected '{1}'")]
    UnsupportedType(String, String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Canon(#[from] peac_canon::CanonError),
}

/// A decoded-but-not-yet-verified envelope: header, the raw payload bytes
/// exactly as received on the wire, and the raw signature bytes.
///
/// Signing input at verify time must be re-derived from these raw bytes,
/// never reconstructed from re-serialised parsed data.
pub struct DecodedEnvelope {
    pub header: Header,
    pub payload_bytes: Vec<u8>,
    pub signature: Vec<u8>,
    pub signing_input: Vec<u8>,
}

/// Encode a header and a canonical-JSON-shaped payload into a signed,
/// compact three-segment token.
pub fn encode(
    header: &Header,
    payload: &serde_json::Value,
    keypair: &Keypair,
) -> Result<String, EnvelopeError> {
    let header_value = serde_json::to_value(header).expect("Header always serialises");
    let header_bytes = peac_canon::canonicalize(&header_value)?;
    let payload_bytes = peac_canon::canonicalize(payload)?;

    let header_b64 = URL_SAFE_NO_PAD.encode(&header_bytes);
    let payload_b64 = URL_SAFE_NO_PAD.encode(&payload_bytes);
    let signing_input = format!("{header_b64}.{payload_b64}");

    let signature = keypair.sign(signing_input.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Decode a compact token without verifying its signature. Rejects
/// malformed segment counts, bad base64/JSON, an unexpected `alg`, or a
/// `typ` that doesn't match the expected wire version.
pub fn decode_without_verify(
    token: &str,
    max_receipt_bytes: usize,
) -> Result<DecodedEnvelope, EnvelopeError> {
    if token.len() > max_receipt_bytes {
        return Err(EnvelopeError::TooLarge {
            max: max_receipt_bytes,
            actual: token.len(),
        });
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(EnvelopeError::MalformedSegments(parts.len()));
    }
    let [header_b64, payload_b64, sig_b64] = [parts[0], parts[1], parts[2]];

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|_| EnvelopeError::InvalidBase64("header"))?;
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| EnvelopeError::InvalidBase64("payload"))?;
    let signature = URL_SAFE_NO_PAD
        .decode(sig_b64)
        .map_err(|_| EnvelopeError::InvalidBase64("signature"))?;

    let header: Header = serde_json::from_slice(&header_bytes)
        .map_err(|_| EnvelopeError::InvalidJson("header"))?;

    if header.alg != "EdDSA" {
        return Err(EnvelopeError::UnsupportedAlgorithm(header.alg));
    }
    let expected_typ = Header::expected_typ();
    if header.typ != expected_typ {
        return Err(EnvelopeError::UnsupportedType(header.typ, expected_typ));
    }

    let signing_input = format!("{header_b64}.{payload_b64}").into_bytes();

    Ok(DecodedEnvelope {
        header,
        payload_bytes,
        signature,
        signing_input,
    })
}

/// Verify a decoded envelope's signature under the given public key.
pub fn verify_signature(envelope: &DecodedEnvelope, key: &PublicKey) -> Result<(), EnvelopeError> {
    key.verify(&envelope.signing_input, &envelope.signature)
        .map_err(EnvelopeError::from)
}
