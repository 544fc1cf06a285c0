use crate::error::ClaimError;
use crate::types::{ClaimInput, PaymentEvidenceInput, PurposeEnforced, PurposeReason, SubjectSnapshot, WorkflowContext};
use regex::Regex;
use std::sync::OnceLock;

/// `undeclared` is internal-only and must never appear in `purpose_declared`.
const UNDECLARED_TOKEN: &str = "undeclared";

fn currency_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z]{3}$").unwrap())
}

fn purpose_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:[a-z0-9_]+:)?[a-z0-9_]+$").unwrap())
}

/// URL fields must start with `https://`.
pub fn validate_url_https(field: &'static str, value: &str) -> Result<(), ClaimError> {
    if !value.starts_with("https://") {
        return Err(ClaimError::new(
            field,
            format!("must start with 'https://', got '{value}'"),
        ));
    }
    Ok(())
}

/// Currency must match `^[A-Z]{3}$`.
pub fn validate_currency(field: &'static str, value: &str) -> Result<(), ClaimError> {
    if !currency_pattern().is_match(value) {
        return Err(ClaimError::new(
            field,
            format!("must be an ISO 4217 upper-case three-letter code, got '{value}'"),
        ));
    }
    Ok(())
}

/// `exp` must be a non-negative integer when present.
pub fn validate_exp(exp: Option<i64>) -> Result<(), ClaimError> {
    if let Some(exp) = exp {
        if exp < 0 {
            return Err(ClaimError::new("exp", "must be a non-negative integer"));
        }
    }
    Ok(())
}

/// `purpose_declared` tokens must be lowercase, optionally `vendor:local`
/// prefixed, and must never contain the internal-only `undeclared` token.
pub fn validate_purpose_declared(tokens: &[String]) -> Result<(), ClaimError> {
    for token in tokens {
        if token == UNDECLARED_TOKEN {
            return Err(ClaimError::new(
                "purpose_declared",
                "Explicit 'undeclared' is not a valid purpose token (internal-only)",
            ));
        }
        if !purpose_token_pattern().is_match(token) {
            return Err(ClaimError::new(
                "purpose_declared",
                format!("token '{token}' must be lowercase, optionally 'vendor:local' prefixed"),
            ));
        }
    }
    Ok(())
}

/// `purpose_enforced` must be one value from the canonical set.
pub fn validate_purpose_enforced(value: &str) -> Result<PurposeEnforced, ClaimError> {
    PurposeEnforced::parse(value).ok_or_else(|| {
        ClaimError::new(
            "purpose_enforced",
            format!(
                "must be one of {:?}, got '{value}'",
                PurposeEnforced::ALL.map(|p| p.as_str())
            ),
        )
    })
}

/// `purpose_reason` must be one value from the closed set.
pub fn validate_purpose_reason(value: &str) -> Result<PurposeReason, ClaimError> {
    PurposeReason::parse(value).ok_or_else(|| {
        ClaimError::new(
            "purpose_reason",
            format!(
                "must be one of {:?}, got '{value}'",
                PurposeReason::ALL.map(|p| p.as_str())
            ),
        )
    })
}

/// Subject snapshots require both `id` and `type` to be present and
/// non-empty.
pub fn validate_subject_snapshot(snapshot: &SubjectSnapshot) -> Result<(), ClaimError> {
    if snapshot.id.trim().is_empty() {
        return Err(ClaimError::new("subject.id", "must not be empty"));
    }
    Ok(())
}

/// Advisory-only: does `id` look like an email address? Callers (the
/// issuance pipeline) use this to decide whether to emit a deduplicated
/// PII warning; it never rejects the snapshot.
pub fn looks_like_email(id: &str) -> bool {
    let Some(at) = id.find('@') else { return false };
    let (local, domain) = (&id[..at], &id[at + 1..]);
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Workflow contexts must not self-reference as a parent, and parent ids
/// must be unique.
pub fn validate_workflow_context(ctx: &WorkflowContext) -> Result<(), ClaimError> {
    if ctx.parent_step_ids.iter().any(|p| p == &ctx.step_id) {
        return Err(ClaimError::new(
            "workflow.parent_step_ids",
            format!("step_id '{}' must not appear in its own parent_step_ids", ctx.step_id),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for parent in &ctx.parent_step_ids {
        if !seen.insert(parent) {
            return Err(ClaimError::new(
                "workflow.parent_step_ids",
                format!("duplicate parent step id '{parent}'"),
            ));
        }
    }
    Ok(())
}

/// Amount fields are non-negative integers by construction (`u64`); this
/// exists to validate `amount == amt` cross-field invariant explicitly.
pub fn validate_amount(field: &'static str, amount: u64, expected: u64) -> Result<(), ClaimError> {
    if amount != expected {
        return Err(ClaimError::new(
            field,
            format!("must equal top-level amount {expected}, got {amount}"),
        ));
    }
    Ok(())
}

fn validate_payment_input(payment: &PaymentEvidenceInput, amt: u64, cur: &str) -> Result<(), ClaimError> {
    validate_amount("payment.amount", payment.amount, amt)?;
    if payment.currency != cur {
        return Err(ClaimError::new(
            "payment.currency",
            format!("must equal top-level currency '{cur}', got '{}'", payment.currency),
        ));
    }
    validate_currency("payment.currency", &payment.currency)?;
    if payment.rail.trim().is_empty() {
        return Err(ClaimError::new("payment.rail", "must not be empty"));
    }
    if payment.reference.trim().is_empty() {
        return Err(ClaimError::new("payment.reference", "must not be empty"));
    }
    Ok(())
}

/// Validate a full claim input prior to assembly and signing. This is the
/// single entry point the issuance pipeline calls; it performs every check
/// from `spec.md` §4.4, failing fast on the first violation.
pub fn validate_claim_input(input: &ClaimInput) -> Result<(), ClaimError> {
    validate_url_https("iss", &input.iss)?;
    validate_url_https("aud", &input.aud)?;
    validate_currency("cur", &input.cur)?;
    validate_exp(input.exp)?;
    validate_payment_input(&input.payment, input.amt, &input.cur)?;

    if let Some(uri) = &input.subject_uri {
        validate_url_https("subject.uri", uri)?;
    }
    if let Some(tokens) = &input.purpose_declared {
        validate_purpose_declared(tokens)?;
    }
    if let Some(enforced) = &input.purpose_enforced {
        validate_purpose_enforced(enforced)?;
    }
    if let Some(reason) = &input.purpose_reason {
        validate_purpose_reason(reason)?;
    }
    if let Some(workflow) = &input.workflow {
        validate_workflow_context(workflow)?;
    }
    Ok(())
}
