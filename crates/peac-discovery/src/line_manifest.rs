use crate::error::DiscoveryError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MAX_LINES: usize = 20;
const MAX_BYTES: usize = 2000;

/// A declared payment rail entry in a discovery manifest's `payments:`
/// section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRailEntry {
    pub rail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

/// The line-oriented discovery manifest resolved at the issuer's
/// `/.well-known/...` endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryManifest {
    pub version: String,
    pub issuer: String,
    pub verify_endpoint: String,
    pub jwks_uri: String,
    #[serde(default)]
    pub payment_rails: Vec<PaymentRailEntry>,
}

/// Parse the restricted line-oriented discovery dialect (`spec.md` §4.5,
/// §6.1). Rejects any construct beyond plain key/value and the declared
/// `payments:` list: anchors/aliases, merge keys, custom tags, and
/// multi-document streams.
pub fn parse_discovery_manifest(text: &str) -> Result<DiscoveryManifest, DiscoveryError> {
    if text.len() > MAX_BYTES {
        return Err(DiscoveryError::TooManyBytes);
    }
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() > MAX_LINES {
        return Err(DiscoveryError::TooManyLines);
    }

    let mut kv: HashMap<String, String> = HashMap::new();
    let mut payment_rails = Vec::new();
    let mut in_payments = false;
    let mut current_entry: Option<PaymentRailEntry> = None;
    let mut doc_separators = 0u32;

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed == "---" {
            doc_separators += 1;
            if doc_separators > 1 {
                return Err(DiscoveryError::MultiDocumentNotAllowed);
            }
            continue;
        }
        reject_forbidden_constructs(trimmed)?;

        if trimmed == "payments:" {
            in_payments = true;
            continue;
        }

        if in_payments {
            if let Some(value) = strip_list_key(trimmed, "- rail:").or_else(|| strip_list_key(trimmed, "- scheme:")) {
                if let Some(entry) = current_entry.take() {
                    payment_rails.push(entry);
                }
                current_entry = Some(PaymentRailEntry {
                    rail: value,
                    info: None,
                });
                continue;
            }
            if let Some(value) = strip_list_key(trimmed, "info:") {
                if let Some(entry) = current_entry.as_mut() {
                    entry.info = Some(value);
                }
                continue;
            }
        }

        let (key, value) = split_kv(trimmed)?;
        kv.insert(key, value);
    }
    if let Some(entry) = current_entry.take() {
        payment_rails.push(entry);
    }

    Ok(DiscoveryManifest {
        version: require(&kv, "version")?,
        issuer: require(&kv, "issuer")?,
        verify_endpoint: require(&kv, "verify_endpoint")?,
        jwks_uri: require(&kv, "jwks_uri")?,
        payment_rails,
    })
}

fn reject_forbidden_constructs(trimmed: &str) -> Result<(), DiscoveryError> {
    if trimmed.starts_with('!') {
        return Err(DiscoveryError::CustomTagsNotAllowed);
    }
    if trimmed.contains("<<") {
        return Err(DiscoveryError::MergeKeysNotAllowed);
    }
    let value_part = trimmed.split_once(':').map(|(_, v)| v.trim()).unwrap_or(trimmed);
    if value_part.starts_with('&') || value_part.starts_with('*') {
        return Err(DiscoveryError::AnchorsNotAllowed);
    }
    Ok(())
}

fn strip_list_key(line: &str, prefix: &str) -> Option<String> {
    line.strip_prefix(prefix).map(|v| unquote(v.trim()))
}

fn split_kv(line: &str) -> Result<(String, String), DiscoveryError> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| DiscoveryError::MalformedLine(line.to_string()))?;
    Ok((key.trim().to_string(), unquote(value.trim())))
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

fn require(kv: &HashMap<String, String>, key: &'static str) -> Result<String, DiscoveryError> {
    kv.get(key).cloned().ok_or(DiscoveryError::MissingField(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_manifest() -> String {
        [
            "version: 1",
            "issuer: https://api.example.com",
            "verify_endpoint: https://api.example.com/verify",
            "jwks_uri: https://api.example.com/.well-known/jwks.json",
            "payments:",
            "- rail: stripe",
            "info: primary",
        ]
        .join("\n")
    }

    #[test]
    fn parses_required_fields_and_payments_section() {
        let manifest = parse_discovery_manifest(&valid_manifest()).unwrap();
        assert_eq!(manifest.version, "1");
        assert_eq!(manifest.issuer, "https://api.example.com");
        assert_eq!(manifest.payment_rails.len(), 1);
        assert_eq!(manifest.payment_rails[0].rail, "stripe");
        assert_eq!(manifest.payment_rails[0].info.as_deref(), Some("primary"));
    }

    #[test]
    fn legacy_scheme_key_is_accepted() {
        let text = [
            "version: 1",
            "issuer: https://api.example.com",
            "verify_endpoint: https://api.example.com/verify",
            "jwks_uri: https://api.example.com/.well-known/jwks.json",
            "payments:",
            "- scheme: paypal",
        ]
        .join("\n");
        let manifest = parse_discovery_manifest(&text).unwrap();
        assert_eq!(manifest.payment_rails[0].rail, "paypal");
    }

    #[test]
    fn rejects_anchor_with_exact_message() {
        let text = "anchor: &ref value\nversion: 1".to_string();
        let err = parse_discovery_manifest(&text).unwrap_err();
        assert_eq!(err.to_string(), "YAML anchors and aliases are not allowed");
    }

    #[test]
    fn rejects_manifests_over_20_lines() {
        let text = (0..25).map(|i| format!("k{i}: v{i}")).collect::<Vec<_>>().join("\n");
        let err = parse_discovery_manifest(&text).unwrap_err();
        assert_eq!(err.to_string(), "manifest exceeds 20 lines");
    }

    #[test]
    fn rejects_merge_keys_and_custom_tags() {
        assert_eq!(
            parse_discovery_manifest("a: <<: *base").unwrap_err(),
            DiscoveryError::MergeKeysNotAllowed
        );
        assert_eq!(
            parse_discovery_manifest("!tag value").unwrap_err(),
            DiscoveryError::CustomTagsNotAllowed
        );
    }

    #[test]
    fn rejects_multi_document_streams() {
        let text = "version: 1\n---\nissuer: https://a\n---\nextra: 1";
        assert_eq!(
            parse_discovery_manifest(text).unwrap_err(),
            DiscoveryError::MultiDocumentNotAllowed
        );
    }

    #[test]
    fn missing_required_field_is_reported() {
        let text = "version: 1\nissuer: https://api.example.com";
        let err = parse_discovery_manifest(text).unwrap_err();
        assert_eq!(err, DiscoveryError::MissingField("verify_endpoint"));
    }
}
