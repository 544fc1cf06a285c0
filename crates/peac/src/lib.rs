//! PEAC receipt issuance and verification facade (`spec.md` §6, §9).
//!
//! Re-exports every component crate so a collaborator depends on one
//! crate, plus [`Issuer`] and [`Verifier`] convenience wrappers that wire
//! issuance/verification together with the telemetry hook. The core
//! never touches HTTP directly -- [`PEAC_RECEIPT_HEADER`] and
//! [`VARY_PEAC_RECEIPT`] are documented constants for a collaborator
//! HTTP layer to apply.

#![deny(unsafe_code)]

pub use peac_canon;
pub use peac_claims;
pub use peac_crypto;
pub use peac_discovery;
pub use peac_envelope;
pub use peac_fetch;
pub use peac_issue;
pub use peac_keys;
pub use peac_rails;
pub use peac_report;
pub use peac_telemetry;
pub use peac_verify;

use std::sync::Arc;

use peac_claims::{ClaimInput, SubjectSnapshot};
use peac_crypto::Keypair;
use peac_discovery::VerifierPolicy;
use peac_fetch::SafeFetcher;
use peac_issue::{IssueError, IssueOutcome, IssueRequest, PiiWarningTracker};
use peac_keys::KeyResolver;
use peac_report::VerificationReport;
use peac_telemetry::{hash_identifier, NoopTelemetryHook, ReceiptIssuedEvent, ReceiptVerifiedEvent, TelemetryHook};
use peac_verify::{VerifierBusy, VerifyLimits};

/// The header name a receipt travels in (`spec.md` §6.3).
pub const PEAC_RECEIPT_HEADER: &str = "PEAC-Receipt";

/// Responses carrying [`PEAC_RECEIPT_HEADER`] should send this `Vary`
/// entry, so shared caches don't serve one caller's receipt to another.
pub const VARY_PEAC_RECEIPT: &str = "PEAC-Receipt";

/// Issues receipts under one signing key, firing `on_receipt_issued`
/// telemetry after each call.
pub struct Issuer {
    keypair: Keypair,
    pii_tracker: PiiWarningTracker,
    telemetry: Arc<dyn TelemetryHook>,
}

impl Issuer {
    pub fn new(keypair: Keypair) -> Self {
        Self::with_telemetry(keypair, Arc::new(NoopTelemetryHook))
    }

    pub fn with_telemetry(keypair: Keypair, telemetry: Arc<dyn TelemetryHook>) -> Self {
        Self {
            keypair,
            pii_tracker: PiiWarningTracker::new(),
            telemetry,
        }
    }

    /// Issue one receipt. Telemetry is fired after a successful issuance
    /// only -- a rejected input never reaches the hook.
    pub fn issue(
        &self,
        kid: impl Into<String>,
        input: ClaimInput,
        subject_snapshot: Option<SubjectSnapshot>,
    ) -> Result<IssueOutcome, IssueError> {
        let kid = kid.into();
        let outcome = peac_issue::issue(
            IssueRequest {
                kid: kid.clone(),
                input,
                subject_snapshot,
                keypair: &self.keypair,
            },
            &self.pii_tracker,
        )?;

        peac_telemetry::notify_issued(
            self.telemetry.clone(),
            ReceiptIssuedEvent {
                rid: outcome.claims.rid.clone(),
                issuer_hash: hash_identifier(&outcome.claims.iss),
                kid_hash: hash_identifier(&kid),
            },
        );

        Ok(outcome)
    }
}

/// Verifies receipts against a fixed trust policy, firing
/// `on_receipt_verified` telemetry after each completed verification
/// (not fired when [`VerifierBusy`] rejects admission, since no
/// verification ran).
pub struct Verifier {
    inner: peac_verify::Verifier,
    telemetry: Arc<dyn TelemetryHook>,
}

impl Verifier {
    pub fn new(policy: VerifierPolicy, fetcher: SafeFetcher, key_resolver: KeyResolver, limits: VerifyLimits) -> Self {
        Self::with_telemetry(policy, fetcher, key_resolver, limits, Arc::new(NoopTelemetryHook))
    }

    pub fn with_telemetry(
        policy: VerifierPolicy,
        fetcher: SafeFetcher,
        key_resolver: KeyResolver,
        limits: VerifyLimits,
        telemetry: Arc<dyn TelemetryHook>,
    ) -> Self {
        Self {
            inner: peac_verify::Verifier::new(policy, fetcher, key_resolver, limits),
            telemetry,
        }
    }

    pub async fn verify(&self, token: &str) -> Result<VerificationReport, VerifierBusy> {
        let report = self.inner.verify(token).await?;
        self.fire_verified(&report);
        Ok(report)
    }

    pub async fn verify_deterministic(&self, token: &str) -> Result<VerificationReport, VerifierBusy> {
        let report = self.inner.verify_deterministic(token).await?;
        self.fire_verified(&report);
        Ok(report)
    }

    fn fire_verified(&self, report: &VerificationReport) {
        peac_telemetry::notify_verified(
            self.telemetry.clone(),
            ReceiptVerifiedEvent {
                reason: report.result.reason.as_str().to_string(),
                issuer_hash: report.result.issuer.as_deref().map(hash_identifier),
                kid_hash: report.result.kid.as_deref().map(hash_identifier),
            },
        );
    }
}
