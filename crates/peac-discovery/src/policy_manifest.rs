use crate::error::DiscoveryError;
use crate::types::{PolicyManifest, PolicyRule, ReceiptsRequirement, UsageKind};

const MAX_BYTES: usize = 2000;

/// Parse a resource owner's policy manifest. This is a dialect distinct
/// from the discovery manifest (`spec.md` §9 open question, resolved):
/// every scalar value must be a double-quoted string drawn from a closed
/// vocabulary, so a typo fails loudly instead of silently defaulting.
pub fn parse_policy_manifest(text: &str) -> Result<PolicyManifest, DiscoveryError> {
    if text.len() > MAX_BYTES {
        return Err(DiscoveryError::TooLarge);
    }

    let mut version = None;
    let mut rules = Vec::new();
    let mut pending_usage: Option<UsageKind> = None;
    let mut pending_receipts: Option<ReceiptsRequirement> = None;
    let mut in_rule = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "rule:" {
            flush_rule(&mut rules, &mut pending_usage, &mut pending_receipts);
            in_rule = true;
            continue;
        }

        let (key, quoted) = split_kv(line)?;
        let value = unquote(&key, quoted)?;

        match key.as_str() {
            "version" if !in_rule => version = Some(value),
            "usage" if in_rule => pending_usage = Some(parse_usage(&value)?),
            "receipts" if in_rule => pending_receipts = Some(parse_receipts(&value)?),
            other => return Err(DiscoveryError::UnrecognizedKey(other.to_string())),
        }
    }
    flush_rule(&mut rules, &mut pending_usage, &mut pending_receipts);

    Ok(PolicyManifest {
        version: version.ok_or(DiscoveryError::MissingField("version"))?,
        rules,
    })
}

fn flush_rule(
    rules: &mut Vec<PolicyRule>,
    usage: &mut Option<UsageKind>,
    receipts: &mut Option<ReceiptsRequirement>,
) {
    if let (Some(usage), Some(receipts)) = (usage.take(), receipts.take()) {
        rules.push(PolicyRule { usage, receipts });
    }
}

fn split_kv(line: &str) -> Result<(String, &str), DiscoveryError> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| DiscoveryError::MalformedLine(line.to_string()))?;
    Ok((key.trim().to_string(), value.trim()))
}

fn unquote(key: &str, value: &str) -> Result<String, DiscoveryError> {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Ok(value[1..value.len() - 1].to_string())
    } else {
        Err(DiscoveryError::InvalidValue(
            leak_key(key),
            format!("'{value}' is not a quoted string"),
        ))
    }
}

fn leak_key(key: &str) -> &'static str {
    match key {
        "version" => "version",
        "usage" => "usage",
        "receipts" => "receipts",
        _ => "unknown",
    }
}

fn parse_usage(value: &str) -> Result<UsageKind, DiscoveryError> {
    match value {
        "training" => Ok(UsageKind::Training),
        "inference" => Ok(UsageKind::Inference),
        "indexing" => Ok(UsageKind::Indexing),
        "other" => Ok(UsageKind::Other),
        _ => Err(DiscoveryError::InvalidValue("usage", value.to_string())),
    }
}

fn parse_receipts(value: &str) -> Result<ReceiptsRequirement, DiscoveryError> {
    match value {
        "required" => Ok(ReceiptsRequirement::Required),
        "optional" => Ok(ReceiptsRequirement::Optional),
        "forbidden" => Ok(ReceiptsRequirement::Forbidden),
        _ => Err(DiscoveryError::InvalidValue("receipts", value.to_string())),
    }
}
