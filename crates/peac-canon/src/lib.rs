//! Deterministic canonical serialisation for PEAC receipts.
//!
//! Given any JSON-shaped value, [`canonicalize`] produces a byte sequence
//! that depends only on the value's semantic content: object members are
//! emitted in byte-lexicographic order of their keys, strings use the
//! minimal-escape rule of RFC 8785 (JCS), and numbers are emitted in their
//! exact source form. Two values that differ only in object-key insertion
//! order canonicalise to the same bytes.

#![deny(unsafe_code)]

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Failures produced while canonicalising a value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanonError {
    #[error("non-finite or unrepresentable number at path '{0}'")]
    InvalidNumber(String),

    #[error("map key is not a string at path '{0}'")]
    NonStringKey(String),
}

/// Canonicalise a JSON value into its deterministic byte representation.
pub fn canonicalize(value: &Value) -> Result<Vec<u8>, CanonError> {
    let mut out = Vec::new();
    write_value(value, &mut out, "$")?;
    Ok(out)
}

/// Canonicalise and SHA-256 digest a value in one step.
///
/// Used by the verification-report builder for `normalized_claims_digest`
/// and by rail adapters that need a stable reference digest.
pub fn digest(value: &Value) -> Result<[u8; 32], CanonError> {
    let bytes = canonicalize(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hasher.finalize().into())
}

fn write_value(value: &Value, out: &mut Vec<u8>, path: &str) -> Result<(), CanonError> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => write_number(n, out, path)?,
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out, &format!("{path}[{i}]"))?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
            out.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(key, out);
                out.push(b':');
                write_value(&map[*key], out, &format!("{path}.{key}"))?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

/// Numbers in receipt claims are integers only; `serde_json`'s
/// arbitrary-precision mode preserves the exact source digits for any
/// non-integer numeric an extension payload might carry, so we re-emit
/// that text verbatim rather than reparsing it as an f64.
fn write_number(n: &serde_json::Number, out: &mut Vec<u8>, path: &str) -> Result<(), CanonError> {
    let text = n.to_string();
    if text.contains(['n', 'N']) {
        // "NaN" / "inf" textual forms that arbitrary-precision mode would
        // otherwise pass through unchanged.
        return Err(CanonError::InvalidNumber(path.to_string()));
    }
    out.extend_from_slice(text.as_bytes());
    Ok(())
}

/// Minimal JSON string escaping per RFC 8785 §3.2.2.2: escape the quote,
/// backslash, and control characters; everything else (including
/// multi-byte UTF-8) is copied through unchanged.
fn write_string(s: &str, out: &mut Vec<u8>) {
    out.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\u{0008}' => out.extend_from_slice(b"\\b"),
            '\u{000C}' => out.extend_from_slice(b"\\f"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                out.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}
