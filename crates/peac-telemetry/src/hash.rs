use sha2::{Digest, Sha256};

/// SHA-256 of `value`, truncated to 16 hex characters and tagged
/// `sha256:`. Used so telemetry can carry an identifier without ever
/// logging it verbatim (`spec.md` §9, "Telemetry without leakage").
pub fn hash_identifier(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("sha256:{}", &hex[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_and_tagged() {
        let a = hash_identifier("alice@example.com");
        let b = hash_identifier("alice@example.com");
        assert_eq!(a, b);
        assert!(a.starts_with("sha256:"));
        assert_eq!(a.len(), "sha256:".len() + 16);
    }

    #[test]
    fn different_inputs_hash_differently() {
        assert_ne!(hash_identifier("alice"), hash_identifier("bob"));
    }
}
