//! Receipt issuance pipeline (`spec.md` §4.8, steps in §5).
//!
//! `issue` validates the caller's input, assembles the full claim set
//! (filling `rid`/`iat`/payment defaults and merging any workflow
//! context into `ext`), canonicalises and signs it, and returns the
//! compact token alongside the assembled claims and any advisory
//! warnings. Subject-profile snapshots never enter the signed claim set
//! -- they travel out of band, next to the token.

#![deny(unsafe_code)]

mod error;
mod warnings;

pub use error::{IssueError, MAX_EXTENSION_BYTES};
pub use warnings::PiiWarningTracker;

use peac_claims::{
    ext_byte_size, looks_like_email, validate_claim_input, validate_purpose_enforced, validate_purpose_reason,
    validate_subject_snapshot, ClaimInput, PaymentEnv, PaymentEvidence, ReceiptClaims, SubjectRef, SubjectSnapshot,
    WorkflowContext, WORKFLOW_EXT_KEY,
};
use peac_crypto::Keypair;
use peac_envelope::{encode, Header};

/// Everything needed to issue one receipt.
pub struct IssueRequest<'a> {
    pub kid: String,
    pub input: ClaimInput,
    pub subject_snapshot: Option<SubjectSnapshot>,
    pub keypair: &'a Keypair,
}

/// The result of a successful issuance.
pub struct IssueOutcome {
    pub token: String,
    pub claims: ReceiptClaims,
    pub subject_snapshot: Option<SubjectSnapshot>,
    pub warnings: Vec<String>,
}

/// Run the full issuance pipeline: validate, assemble, canonicalise,
/// sign.
pub fn issue(request: IssueRequest<'_>, pii_tracker: &PiiWarningTracker) -> Result<IssueOutcome, IssueError> {
    validate_claim_input(&request.input)?;

    let mut warnings = Vec::new();
    if let Some(snapshot) = &request.subject_snapshot {
        validate_subject_snapshot(snapshot)?;
        if looks_like_email(&snapshot.id) && pii_tracker.should_warn(&snapshot.id) {
            warnings.push(format!("subject id '{}' looks like a raw email address", snapshot.id));
        }
    }

    let claims = assemble_claims(request.input)?;
    let header = Header::new(request.kid);
    let payload = serde_json::to_value(&claims).expect("ReceiptClaims always serialises");
    let token = encode(&header, &payload, request.keypair)?;

    tracing::debug!(rid = %claims.rid, iss = %claims.iss, "issued receipt");

    Ok(IssueOutcome {
        token,
        claims,
        subject_snapshot: request.subject_snapshot,
        warnings,
    })
}

fn assemble_claims(input: ClaimInput) -> Result<ReceiptClaims, IssueError> {
    let rid = uuid::Uuid::now_v7().to_string();
    let iat = chrono::Utc::now().timestamp();

    let payment_input = input.payment;
    let payment = PaymentEvidence {
        rail: payment_input.rail,
        reference: payment_input.reference,
        amount: payment_input.amount,
        currency: payment_input.currency,
        asset: payment_input.asset.unwrap_or_else(|| input.cur.clone()),
        env: payment_input.env.unwrap_or(PaymentEnv::Test),
        evidence: payment_input.evidence.unwrap_or_default(),
        network: payment_input.network,
        facilitator_ref: payment_input.facilitator_ref,
        idempotency_key: payment_input.idempotency_key,
        metadata: payment_input.metadata,
    };

    let purpose_enforced = input
        .purpose_enforced
        .as_deref()
        .map(validate_purpose_enforced)
        .transpose()?;
    let purpose_reason = input
        .purpose_reason
        .as_deref()
        .map(validate_purpose_reason)
        .transpose()?;

    let mut ext = input.ext.unwrap_or_default();
    if let Some(workflow) = input.workflow {
        merge_workflow_context(&mut ext, workflow)?;
    }
    let ext = if ext.is_empty() { None } else { Some(ext) };

    if let Some(ext) = &ext {
        let size = ext_byte_size(ext);
        if size > MAX_EXTENSION_BYTES {
            return Err(IssueError::ExtensionTooLarge {
                max: MAX_EXTENSION_BYTES,
                actual: size,
            });
        }
    }

    Ok(ReceiptClaims {
        iss: input.iss,
        aud: input.aud,
        iat,
        rid,
        amt: input.amt,
        cur: input.cur,
        payment,
        exp: input.exp,
        subject: input.subject_uri.map(|uri| SubjectRef { uri }),
        purpose_declared: input.purpose_declared,
        purpose_enforced,
        purpose_reason,
        ext,
    })
}

fn merge_workflow_context(
    ext: &mut std::collections::BTreeMap<String, serde_json::Value>,
    workflow: WorkflowContext,
) -> Result<(), IssueError> {
    if ext.contains_key(WORKFLOW_EXT_KEY) {
        return Err(IssueError::ReservedExtensionKey(WORKFLOW_EXT_KEY));
    }
    let value = serde_json::to_value(workflow).expect("WorkflowContext always serialises");
    ext.insert(WORKFLOW_EXT_KEY.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use peac_claims::PaymentEvidenceInput;

    fn sample_input() -> ClaimInput {
        ClaimInput {
            iss: "https://issuer.example.com".to_string(),
            aud: "https://resource.example.com".to_string(),
            amt: 500,
            cur: "USD".to_string(),
            payment: PaymentEvidenceInput {
                rail: "stripe".to_string(),
                reference: "cs_test_1".to_string(),
                amount: 500,
                currency: "USD".to_string(),
                asset: None,
                env: None,
                evidence: None,
                network: None,
                facilitator_ref: None,
                idempotency_key: None,
                metadata: None,
            },
            exp: None,
            subject_uri: None,
            purpose_declared: None,
            purpose_enforced: None,
            purpose_reason: None,
            workflow: None,
            ext: None,
        }
    }

    #[test]
    fn issues_a_verifiable_token_with_filled_defaults() {
        let kp = Keypair::from_seed_bytes(&[9u8; 32]).unwrap();
        let tracker = PiiWarningTracker::new();
        let outcome = issue(
            IssueRequest {
                kid: "key-1".to_string(),
                input: sample_input(),
                subject_snapshot: None,
                keypair: &kp,
            },
            &tracker,
        )
        .unwrap();

        assert_eq!(outcome.claims.payment.asset, "USD");
        assert_eq!(outcome.claims.payment.env, PaymentEnv::Test);
        assert!(!outcome.claims.rid.is_empty());
        assert!(outcome.warnings.is_empty());

        let decoded = peac_envelope::decode_without_verify(&outcome.token, 16 * 1024).unwrap();
        peac_envelope::verify_signature(&decoded, &kp.public_key()).unwrap();
    }

    #[test]
    fn workflow_context_is_merged_into_ext() {
        let kp = Keypair::from_seed_bytes(&[9u8; 32]).unwrap();
        let tracker = PiiWarningTracker::new();
        let mut input = sample_input();
        input.workflow = Some(WorkflowContext {
            workflow_id: "wf-1".to_string(),
            step_id: "step-1".to_string(),
            parent_step_ids: vec![],
            step_index: Some(0),
            step_total: Some(3),
        });

        let outcome = issue(
            IssueRequest {
                kid: "key-1".to_string(),
                input,
                subject_snapshot: None,
                keypair: &kp,
            },
            &tracker,
        )
        .unwrap();

        let ext = outcome.claims.ext.expect("ext should be populated");
        assert!(ext.contains_key(WORKFLOW_EXT_KEY));
    }

    #[test]
    fn email_like_subject_emits_one_time_advisory() {
        let kp = Keypair::from_seed_bytes(&[9u8; 32]).unwrap();
        let tracker = PiiWarningTracker::new();
        let snapshot = SubjectSnapshot {
            id: "alice@example.com".to_string(),
            subject_type: peac_claims::SubjectType::Human,
            labels: None,
            captured_at: chrono::Utc::now(),
            source: None,
            version: None,
        };

        let first = issue(
            IssueRequest {
                kid: "key-1".to_string(),
                input: sample_input(),
                subject_snapshot: Some(snapshot.clone()),
                keypair: &kp,
            },
            &tracker,
        )
        .unwrap();
        assert_eq!(first.warnings.len(), 1);

        let second = issue(
            IssueRequest {
                kid: "key-1".to_string(),
                input: sample_input(),
                subject_snapshot: Some(snapshot),
                keypair: &kp,
            },
            &tracker,
        )
        .unwrap();
        assert!(second.warnings.is_empty());
    }

    #[test]
    fn rejects_invalid_input_before_signing() {
        let kp = Keypair::from_seed_bytes(&[9u8; 32]).unwrap();
        let tracker = PiiWarningTracker::new();
        let mut input = sample_input();
        input.iss = "http://not-https.example.com".to_string();

        let err = issue(
            IssueRequest {
                kid: "key-1".to_string(),
                input,
                subject_snapshot: None,
                keypair: &kp,
            },
            &tracker,
        )
        .unwrap_err();
        assert!(matches!(err, IssueError::Claim(_)));
    }
}
