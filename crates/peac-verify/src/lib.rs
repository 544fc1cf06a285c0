//! Ordered receipt verification pipeline (`spec.md` §4.9).
//!
//! [`Verifier::verify`] runs the fixed twelve-check sequence in
//! [`peac_report::CheckName::ORDER`], short-circuiting to `skip` on the
//! first failure. Two checks never run on the current wire version --
//! `transport.profile_binding` and `policy.binding` -- and are always
//! recorded as `skip` with a fixed detail string rather than omitted,
//! so every report carries all twelve entries regardless of outcome.

#![deny(unsafe_code)]

mod admission;
mod fetch_map;
mod limits;
mod time_window;

pub use admission::{AdmissionGuard, InflightPermit, VerifierBusy};
pub use fetch_map::{map_fetch_error, FetchContext};
pub use limits::VerifyLimits;
pub use time_window::evaluate_time_window;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use peac_claims::{validate_amount, validate_currency, ReceiptClaims};
use peac_discovery::{
    check_issuer_allowed, find_pinned_key, parse_json_issuer_config, DiscoveryError, KeyPin as DiscoveryKeyPin,
    VerifierPolicy,
};
use peac_envelope::{decode_without_verify, verify_signature, EnvelopeError};
use peac_fetch::SafeFetcher;
use peac_keys::{KeyError, KeyPin, KeyResolver, KeySource as ResolvedKeySource};
use peac_report::{
    CheckName, InputEcho, KeySource, PolicyEcho, Reason, ReportBuilder, VerificationReport, VerificationResult,
};

/// Wire version this pipeline verifies. Mirrors `peac_envelope::WIRE_VERSION`.
const RECEIPT_TYPE: &str = "peac-receipt/01";

/// Verifies receipts against a fixed trust policy and key resolver.
pub struct Verifier {
    policy: VerifierPolicy,
    fetcher: SafeFetcher,
    key_resolver: KeyResolver,
    limits: VerifyLimits,
    admission: AdmissionGuard,
}

impl Verifier {
    pub fn new(
        policy: VerifierPolicy,
        fetcher: SafeFetcher,
        key_resolver: KeyResolver,
        limits: VerifyLimits,
    ) -> Self {
        let admission = AdmissionGuard::new(limits.max_inflight);
        Self {
            policy,
            fetcher,
            key_resolver,
            limits,
            admission,
        }
    }

    /// Verify a compact token, producing a full report (includes `meta`
    /// and every recorded artifact). Returns [`VerifierBusy`] without
    /// running any check if the inflight bound is exceeded.
    pub async fn verify(&self, token: &str) -> Result<VerificationReport, VerifierBusy> {
        let _permit = self.admission.admit()?;
        let outcome = self.run(token).await;
        Ok(outcome.build(outcome.result.clone()))
    }

    /// Verify and return the deterministic report only (no `meta`, no
    /// non-deterministic artifacts).
    pub async fn verify_deterministic(&self, token: &str) -> Result<VerificationReport, VerifierBusy> {
        let _permit = self.admission.admit()?;
        let outcome = self.run(token).await;
        Ok(outcome.build_deterministic(outcome.result.clone()))
    }

    async fn run(&self, token: &str) -> Outcome {
        let policy_echo = PolicyEcho {
            mode: self.policy.mode.as_str().to_string(),
            issuer_allowlist_count: self.policy.allowed_issuers.len(),
        };
        let input_echo = InputEcho {
            receipt_type: None,
            token_length: token.len(),
        };
        let mut builder = ReportBuilder::new("1", input_echo, policy_echo);

        macro_rules! fail {
            ($check:expr, $reason:expr) => {{
                builder.fail($check, $reason);
                return Outcome::new(builder, $reason, None, None, None);
            }};
        }

        // jws.parse: segment count, ahead of any size/base64/JSON work.
        let segments = token.split('.').count();
        if segments != 3 {
            fail!(CheckName::JwsParse, Reason::MalformedReceipt);
        }
        builder.pass(CheckName::JwsParse);

        // limits.receipt_bytes
        if token.len() > self.limits.max_receipt_bytes {
            fail!(CheckName::LimitsReceiptBytes, Reason::ReceiptTooLarge);
        }
        builder.pass(CheckName::LimitsReceiptBytes);

        // jws.protected_header: base64/JSON/alg/typ, folded from the
        // envelope's own decode step (segment count and size are already
        // covered above, so only the remaining variants can occur here).
        let decoded = match decode_without_verify(token, self.limits.max_receipt_bytes) {
            Ok(decoded) => decoded,
            Err(err) => {
                let reason = map_envelope_decode_error(&err);
                fail!(CheckName::JwsProtectedHeader, reason);
            }
        };
        if decoded.header.kid.trim().is_empty() {
            fail!(CheckName::JwsProtectedHeader, Reason::MalformedReceipt);
        }
        builder.pass(CheckName::JwsProtectedHeader);

        // claims.schema_unverified: deserialize and cross-validate, before
        // the signature is checked -- the claims are not yet trusted.
        let claims: ReceiptClaims = match serde_json::from_slice(&decoded.payload_bytes) {
            Ok(claims) => claims,
            Err(_) => fail!(CheckName::ClaimsSchemaUnverified, Reason::SchemaInvalid),
        };
        if validate_currency("cur", &claims.cur).is_err() {
            fail!(CheckName::ClaimsSchemaUnverified, Reason::SchemaInvalid);
        }
        if validate_amount("payment.amount", claims.payment.amount, claims.amt).is_err() {
            fail!(CheckName::ClaimsSchemaUnverified, Reason::SchemaInvalid);
        }
        if claims.payment.currency != claims.cur {
            fail!(CheckName::ClaimsSchemaUnverified, Reason::SchemaInvalid);
        }
        builder.pass(CheckName::ClaimsSchemaUnverified);

        // issuer.trust_policy
        if check_issuer_allowed(&self.policy, &claims.iss).is_err() {
            fail!(CheckName::IssuerTrustPolicy, Reason::IssuerNotAllowed);
        }
        builder.pass(CheckName::IssuerTrustPolicy);

        // key.resolve pin lookup happens before any network access so a
        // raw pinned key can skip issuer.discovery entirely (`spec.md`
        // §4.7 step 1: "a pinned key resolves without any network access").
        let key_pin = find_pinned_key(&self.policy, &claims.iss, &decoded.header.kid).map(to_key_pin);
        let network_allowed = self.policy.mode.permits_network_fetch();

        // issuer.discovery
        let jwks_uri = if matches!(key_pin, Some(KeyPin::Raw(_))) {
            builder.skip(CheckName::IssuerDiscovery, Some("offline_pinned_key_no_discovery_needed"));
            None
        } else {
            let discovery_url = format!("{}/.well-known/peac-configuration", claims.iss.trim_end_matches('/'));
            let discovery_response = match self.fetcher.fetch(&discovery_url, None).await {
                Ok(response) => response,
                Err(err) => {
                    let reason = map_fetch_error(FetchContext::Key, &err);
                    fail!(CheckName::IssuerDiscovery, reason);
                }
            };
            let config = match parse_json_issuer_config(&discovery_response.body) {
                Ok(config) => config,
                Err(err) => {
                    let reason = map_discovery_error(&err);
                    fail!(CheckName::IssuerDiscovery, reason);
                }
            };
            builder.pass(CheckName::IssuerDiscovery);
            Some(config.jwks_uri)
        };

        // key.resolve
        let resolution = match self
            .key_resolver
            .resolve(
                jwks_uri.as_deref().unwrap_or(""),
                &decoded.header.kid,
                key_pin.as_ref(),
                network_allowed,
            )
            .await
        {
            Ok(resolution) => resolution,
            Err(err) => {
                let reason = map_key_error(&err);
                fail!(CheckName::KeyResolve, reason);
            }
        };
        let key_source = match resolution.source {
            ResolvedKeySource::Pinned => KeySource::Pinned,
            ResolvedKeySource::JwksFetch => KeySource::JwksFetch,
        };
        builder.artifacts_mut().issuer_key_source = Some(key_source);
        builder.artifacts_mut().issuer_key_thumbprint = Some(resolution.key.thumbprint.clone());
        if let Some(digest) = resolution.jwks_digest {
            builder.artifacts_mut().issuer_jwks_digest = Some(digest);
        }
        builder.pass(CheckName::KeyResolve);
        let resolved = resolution.key;

        // jws.signature
        if verify_signature(&decoded, &resolved.public_key).is_err() {
            fail!(CheckName::JwsSignature, Reason::SignatureInvalid);
        }
        builder.pass(CheckName::JwsSignature);

        // claims.time_window
        let now = chrono::Utc::now().timestamp();
        if let Some(reason) = time_window::evaluate_time_window(claims.iat, claims.exp, now, self.limits.clock_skew_s)
        {
            fail!(CheckName::ClaimsTimeWindow, reason);
        }
        builder.pass(CheckName::ClaimsTimeWindow);

        // extensions.limits
        if let Some(ext) = &claims.ext {
            if peac_claims::ext_byte_size(ext) > self.limits.max_extension_bytes {
                fail!(CheckName::ExtensionsLimits, Reason::ExtensionTooLarge);
            }
        }
        builder.pass(CheckName::ExtensionsLimits);

        // transport.profile_binding: no transport-binding wire field
        // exists on the current version, so this always skips.
        builder.skip(CheckName::TransportProfileBinding, None);

        // policy.binding: no policy digest field exists on the current
        // wire version; the fixed detail string records why.
        builder.skip(CheckName::PolicyBinding, Some("wire_01_no_policy_digest"));

        let claims_value = serde_json::to_value(&claims).expect("ReceiptClaims always serialises");
        if let Ok(digest) = peac_canon::digest(&claims_value) {
            builder.artifacts_mut().normalized_claims_digest = Some(format!("sha256:{}", URL_SAFE_NO_PAD.encode(digest)));
        }

        Outcome::new(
            builder,
            Reason::Ok,
            Some(claims.iss.clone()),
            Some(decoded.header.kid.clone()),
            None,
        )
    }
}

/// The builder plus the terminal [`VerificationResult`], carried together
/// so `build`/`build_deterministic` can be called after the pipeline runs
/// without re-deriving the result.
struct Outcome {
    builder: ReportBuilder,
    result: VerificationResult,
}

impl Outcome {
    fn new(
        builder: ReportBuilder,
        reason: Reason,
        issuer: Option<String>,
        kid: Option<String>,
        policy_binding: Option<String>,
    ) -> Self {
        let result = VerificationResult {
            valid: reason == Reason::Ok,
            reason,
            severity: reason.severity(),
            receipt_type: RECEIPT_TYPE.to_string(),
            issuer,
            kid,
            policy_binding,
        };
        Self { builder, result }
    }

    fn build(&self, result: VerificationResult) -> VerificationReport {
        self.builder.build(result)
    }

    fn build_deterministic(&self, result: VerificationResult) -> VerificationReport {
        self.builder.build_deterministic(result)
    }
}

fn map_envelope_decode_error(err: &EnvelopeError) -> Reason {
    match err {
        EnvelopeError::TooLarge { .. } => Reason::ReceiptTooLarge,
        EnvelopeError::MalformedSegments(_)
        | EnvelopeError::InvalidBase64(_)
        | EnvelopeError::InvalidJson(_)
        | EnvelopeError::UnsupportedAlgorithm(_)
        | EnvelopeError::UnsupportedType(_, _)
        | EnvelopeError::Crypto(_)
        | EnvelopeError::Canon(_) => Reason::MalformedReceipt,
    }
}

fn map_discovery_error(_err: &DiscoveryError) -> Reason {
    // No discovery-specific entry exists in the closed taxonomy; any
    // failure to obtain a usable discovery document prevents key
    // resolution, so it is folded into the nearest key-path reason.
    Reason::KeyFetchFailed
}

/// Convert a discovery-side pin (borrowed from the policy) into the
/// owned form the resolver consumes, keeping `peac-keys` and
/// `peac-discovery` decoupled from each other's types.
fn to_key_pin(pin: DiscoveryKeyPin<'_>) -> KeyPin {
    match pin {
        DiscoveryKeyPin::Raw(jwk) => KeyPin::Raw(jwk.clone()),
        DiscoveryKeyPin::Thumbprint(tp) => KeyPin::Thumbprint(tp.to_string()),
    }
}

fn map_key_error(err: &KeyError) -> Reason {
    match err {
        KeyError::KidNotFound(_)
        | KeyError::PinMismatch(_)
        | KeyError::InvalidKeySet(_)
        | KeyError::Crypto(_)
        | KeyError::KeysetJump => Reason::KeyNotFound,
        KeyError::Fetch(fetch_err) => map_fetch_error(FetchContext::Key, fetch_err),
        KeyError::TooManyKeys(_) => Reason::JwksTooManyKeys,
        KeyError::NegativeCached | KeyError::LockPoisoned | KeyError::HttpStatus(_) => Reason::KeyFetchFailed,
        // No network access was even attempted; this is a policy-level
        // block on the key path, the same bucket SSRF rejections land in.
        KeyError::NetworkNotPermitted => Reason::KeyFetchBlocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peac_claims::{ClaimInput, PaymentEnv, PaymentEvidenceInput};
    use peac_crypto::Keypair;
    use peac_discovery::Mode;
    use peac_fetch::{FetchLimits, RuntimeCapability};
    use peac_issue::{issue, IssueRequest, PiiWarningTracker};
    use peac_keys::CacheConfig;

    fn keypair() -> Keypair {
        Keypair::from_seed_bytes(&[9u8; 32]).unwrap()
    }

    fn claim_input(amt: u64, exp: Option<i64>) -> ClaimInput {
        ClaimInput {
            iss: "https://issuer.example.com".to_string(),
            aud: "https://relying-party.example.com".to_string(),
            amt,
            cur: "USD".to_string(),
            payment: PaymentEvidenceInput {
                rail: "stripe".to_string(),
                reference: "cs_test_1".to_string(),
                amount: amt,
                currency: "USD".to_string(),
                asset: None,
                env: Some(PaymentEnv::Test),
                evidence: None,
                network: None,
                facilitator_ref: None,
                idempotency_key: None,
                metadata: None,
            },
            exp,
            subject_uri: None,
            purpose_declared: None,
            purpose_enforced: None,
            purpose_reason: None,
            workflow: None,
            ext: None,
        }
    }

    /// A fetcher whose port allow-list is empty fails every fetch at
    /// URL validation, before any DNS or network I/O -- the same
    /// offline-safe pattern `peac-fetch`'s own tests use.
    fn blocked_fetcher() -> SafeFetcher {
        let limits = FetchLimits {
            allowed_ports: vec![],
            ..FetchLimits::default()
        };
        SafeFetcher::with_capability(RuntimeCapability::Minimal, limits).unwrap()
    }

    fn verifier_with_policy(policy: VerifierPolicy) -> Verifier {
        let key_resolver = KeyResolver::new(blocked_fetcher(), CacheConfig::default(), 16);
        Verifier::new(policy, blocked_fetcher(), key_resolver, VerifyLimits::default())
    }

    /// S1: a well-formed, unexpired token passes every check the pipeline
    /// can complete without live network access -- parsing, protected
    /// header, schema, and trust policy -- before the network-dependent
    /// discovery check is reached.
    #[tokio::test]
    async fn s1_valid_token_passes_every_check_up_to_the_network_boundary() {
        let kp = keypair();
        let tracker = PiiWarningTracker::new();
        let outcome = issue(
            IssueRequest {
                kid: "2025-01-15T10:30:00Z".to_string(),
                input: claim_input(1000, None),
                subject_snapshot: None,
                keypair: &kp,
            },
            &tracker,
        )
        .unwrap();

        let policy = VerifierPolicy {
            allowed_issuers: vec!["https://issuer.example.com".to_string()],
            mode: Mode::NetworkAllowed,
            ..VerifierPolicy::default()
        };
        let verifier = verifier_with_policy(policy);
        let report = verifier.verify(&outcome.token).await.unwrap();

        let passed: Vec<_> = report
            .checks
            .iter()
            .take_while(|c| c.status == peac_report::CheckStatus::Pass)
            .map(|c| c.name)
            .collect();
        assert_eq!(
            passed,
            vec![
                CheckName::JwsParse,
                CheckName::LimitsReceiptBytes,
                CheckName::JwsProtectedHeader,
                CheckName::ClaimsSchemaUnverified,
                CheckName::IssuerTrustPolicy,
            ]
        );
        assert_eq!(report.result.reason, Reason::KeyFetchBlocked);
        let discovery = report
            .checks
            .iter()
            .find(|c| c.name == CheckName::IssuerDiscovery)
            .unwrap();
        assert_eq!(discovery.status, peac_report::CheckStatus::Fail);
    }

    /// An issuer outside the allow-list is rejected at `issuer.trust_policy`,
    /// the earliest check that can fail, and every later check -- including
    /// the network-dependent ones -- is skipped without being attempted.
    #[tokio::test]
    async fn untrusted_issuer_short_circuits_before_any_network_check() {
        let kp = keypair();
        let tracker = PiiWarningTracker::new();
        let outcome = issue(
            IssueRequest {
                kid: "2025-01-15T10:30:00Z".to_string(),
                input: claim_input(250, None),
                subject_snapshot: None,
                keypair: &kp,
            },
            &tracker,
        )
        .unwrap();

        let policy = VerifierPolicy {
            allowed_issuers: vec!["https://someone-else.example.com".to_string()],
            mode: Mode::NetworkAllowed,
            ..VerifierPolicy::default()
        };
        let verifier = verifier_with_policy(policy);
        let report = verifier.verify(&outcome.token).await.unwrap();

        assert_eq!(report.result.reason, Reason::IssuerNotAllowed);
        let fail_index = report
            .checks
            .iter()
            .position(|c| c.status == peac_report::CheckStatus::Fail)
            .unwrap();
        assert_eq!(report.checks[fail_index].name, CheckName::IssuerTrustPolicy);
        assert!(report.checks[fail_index + 1..]
            .iter()
            .all(|c| c.status == peac_report::CheckStatus::Skip));
    }

    /// S6: an issuer whose discovery endpoint resolves to loopback is
    /// rejected as an SSRF-blocked fetch, not a generic network error.
    /// `127.0.0.1` resolves without any external DNS lookup, so this stays
    /// offline-safe while still exercising the real address-space guard.
    #[tokio::test]
    async fn s6_loopback_issuer_discovery_target_is_blocked() {
        let limits = FetchLimits {
            allowed_ports: vec![443],
            ..FetchLimits::default()
        };
        let fetcher = SafeFetcher::with_capability(RuntimeCapability::FullDnsPreresolution, limits.clone()).unwrap();
        let key_resolver = KeyResolver::new(
            SafeFetcher::with_capability(RuntimeCapability::FullDnsPreresolution, limits).unwrap(),
            CacheConfig::default(),
            16,
        );
        let policy = VerifierPolicy {
            allowed_issuers: vec!["https://127.0.0.1".to_string()],
            mode: Mode::NetworkAllowed,
            ..VerifierPolicy::default()
        };
        let verifier = Verifier::new(policy, fetcher, key_resolver, VerifyLimits::default());

        let kp = keypair();
        let tracker = PiiWarningTracker::new();
        let mut input = claim_input(100, None);
        input.iss = "https://127.0.0.1".to_string();
        let outcome = issue(
            IssueRequest {
                kid: "k1".to_string(),
                input,
                subject_snapshot: None,
                keypair: &kp,
            },
            &tracker,
        )
        .unwrap();

        let report = verifier.verify(&outcome.token).await.unwrap();
        assert_eq!(report.result.reason, Reason::KeyFetchBlocked);
        let discovery_check = report
            .checks
            .iter()
            .find(|c| c.name == CheckName::IssuerDiscovery)
            .unwrap();
        assert_eq!(discovery_check.status, peac_report::CheckStatus::Fail);
    }

    #[tokio::test]
    async fn admission_guard_rejects_once_inflight_bound_is_hit() {
        let policy = VerifierPolicy {
            allowed_issuers: vec!["https://issuer.example.com".to_string()],
            mode: Mode::NetworkAllowed,
            ..VerifierPolicy::default()
        };
        let fetcher = SafeFetcher::with_capability(RuntimeCapability::Minimal, FetchLimits::default()).unwrap();
        let key_resolver = KeyResolver::new(
            SafeFetcher::with_capability(RuntimeCapability::Minimal, FetchLimits::default()).unwrap(),
            CacheConfig::default(),
            16,
        );
        let mut limits = VerifyLimits::default();
        limits.max_inflight = 1;
        let verifier = Verifier::new(policy, fetcher, key_resolver, limits);

        let _permit = verifier.admission.admit().unwrap();
        let err = verifier.verify("a.b.c").await.unwrap_err();
        assert_eq!(err, VerifierBusy);
    }
}
