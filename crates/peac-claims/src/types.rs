use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `purpose_enforced`: a single value from the fixed canonical set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurposeEnforced {
    Train,
    Search,
    UserAction,
    Inference,
    Index,
}

impl PurposeEnforced {
    pub const ALL: [PurposeEnforced; 5] = [
        PurposeEnforced::Train,
        PurposeEnforced::Search,
        PurposeEnforced::UserAction,
        PurposeEnforced::Inference,
        PurposeEnforced::Index,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PurposeEnforced::Train => "train",
            PurposeEnforced::Search => "search",
            PurposeEnforced::UserAction => "user_action",
            PurposeEnforced::Inference => "inference",
            PurposeEnforced::Index => "index",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

/// `purpose_reason`: a single value from the closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurposeReason {
    Allowed,
    Constrained,
    Denied,
    Downgraded,
    UndeclaredDefault,
    UnknownPreserved,
}

impl PurposeReason {
    pub const ALL: [PurposeReason; 6] = [
        PurposeReason::Allowed,
        PurposeReason::Constrained,
        PurposeReason::Denied,
        PurposeReason::Downgraded,
        PurposeReason::UndeclaredDefault,
        PurposeReason::UnknownPreserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PurposeReason::Allowed => "allowed",
            PurposeReason::Constrained => "constrained",
            PurposeReason::Denied => "denied",
            PurposeReason::Downgraded => "downgraded",
            PurposeReason::UndeclaredDefault => "undeclared_default",
            PurposeReason::UnknownPreserved => "unknown_preserved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

/// `env` on payment evidence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentEnv {
    Live,
    Test,
}

impl Default for PaymentEnv {
    fn default() -> Self {
        PaymentEnv::Test
    }
}

/// Payment evidence nested inside the receipt claims.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentEvidence {
    pub rail: String,
    pub reference: String,
    pub amount: u64,
    pub currency: String,
    pub asset: String,
    #[serde(default)]
    pub env: PaymentEnv,
    #[serde(default)]
    pub evidence: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilitator_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

/// Input to issuance before defaults are filled in (`asset`, `env`,
/// `evidence` are optional here; [`crate::validators::validate_payment_evidence_input`]
/// and the issuance pipeline fill their defaults).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentEvidenceInput {
    pub rail: String,
    pub reference: String,
    pub amount: u64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<PaymentEnv>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilitator_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

/// Subject type on an optional out-of-band subject-profile snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Human,
    Org,
    Agent,
}

/// Subject-profile snapshot: optional out-of-band metadata, not signed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubjectSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    pub captured_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Workflow context stored at the reserved `ext` extension key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowContext {
    pub workflow_id: String,
    pub step_id: String,
    pub parent_step_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_total: Option<u32>,
}

/// The reserved `ext` key under which a [`WorkflowContext`] is merged.
pub const WORKFLOW_EXT_KEY: &str = "peac:workflow";

/// Raw, unvalidated input to the issuance pipeline. Mirrors the required
/// and optional fields of the signed claim set, minus `rid`/`iat` which
/// the issuance pipeline mints itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClaimInput {
    pub iss: String,
    pub aud: String,
    pub amt: u64,
    pub cur: String,
    pub payment: PaymentEvidenceInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose_declared: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose_enforced: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<WorkflowContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<BTreeMap<String, serde_json::Value>>,
}

/// The fully assembled, signed claim set (the envelope payload).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReceiptClaims {
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub rid: String,
    pub amt: u64,
    pub cur: String,
    pub payment: PaymentEvidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose_declared: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose_enforced: Option<PurposeEnforced>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose_reason: Option<PurposeReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<BTreeMap<String, serde_json::Value>>,
}

/// The signed `subject.{uri}` reference (distinct from the unsigned
/// [`SubjectSnapshot`]).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubjectRef {
    pub uri: String,
}
