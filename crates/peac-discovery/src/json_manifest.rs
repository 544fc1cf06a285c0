use crate::error::DiscoveryError;
use crate::types::JsonIssuerConfig;

const MAX_BYTES: usize = 64 * 1024;

/// Parse the JSON issuer configuration document. This dialect carries
/// more structure than the line-oriented manifest and is bounded only by
/// a flat byte cap, not a line count.
pub fn parse_json_issuer_config(bytes: &[u8]) -> Result<JsonIssuerConfig, DiscoveryError> {
    if bytes.len() > MAX_BYTES {
        return Err(DiscoveryError::TooLarge);
    }
    serde_json::from_slice(bytes).map_err(|e| DiscoveryError::InvalidJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_config() {
        let body = r#"{
            "issuer": "https://api.example.com",
            "verify_endpoint": "https://api.example.com/verify",
            "jwks_uri": "https://api.example.com/.well-known/jwks.json",
            "payment_rails": [{"rail": "stripe"}]
        }"#;
        let config = parse_json_issuer_config(body.as_bytes()).unwrap();
        assert_eq!(config.issuer, "https://api.example.com");
        assert_eq!(config.payment_rails[0].rail, "stripe");
    }

    #[test]
    fn rejects_oversized_body() {
        let body = vec![b' '; MAX_BYTES + 1];
        assert_eq!(parse_json_issuer_config(&body).unwrap_err(), DiscoveryError::TooLarge);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = parse_json_issuer_config(b"{not json}").unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidJson(_)));
    }
}
