use crate::artifacts::Artifacts;
use crate::checks::{CheckEntry, CheckName, CheckStatus};
use crate::reason::{Reason, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Echo of the decoded receipt's identifying fields, unsigned context
/// carried into the report for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEcho {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_type: Option<String>,
    pub token_length: usize,
}

/// Echo of the trust policy in force for this verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEcho {
    pub mode: String,
    pub issuer_allowlist_count: usize,
}

/// The top-level verification outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub valid: bool,
    pub reason: Reason,
    pub severity: Severity,
    pub receipt_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_binding: Option<String>,
}

/// Non-deterministic metadata: omitted entirely from deterministic reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub generated_at: DateTime<Utc>,
    pub verifier_name: String,
    pub verifier_version: String,
}

/// `{report_version, input, policy, result, checks[], artifacts?, meta?}`
/// (`spec.md` §3.1, §6.1).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub report_version: String,
    pub input: InputEcho,
    pub policy: PolicyEcho,
    pub result: VerificationResult,
    pub checks: Vec<CheckEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Artifacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// Fluent accumulator for a verification report (`spec.md` §4.10). Checks
/// must be appended in [`CheckName::ORDER`]; [`ReportBuilder::fail`] marks
/// every remaining unreported check `skip` automatically.
pub struct ReportBuilder {
    report_version: String,
    input: InputEcho,
    policy: PolicyEcho,
    checks: Vec<CheckEntry>,
    artifacts: Artifacts,
    verifier_name: String,
    verifier_version: String,
}

impl ReportBuilder {
    pub fn new(report_version: impl Into<String>, input: InputEcho, policy: PolicyEcho) -> Self {
        Self {
            report_version: report_version.into(),
            input,
            policy,
            checks: Vec::new(),
            artifacts: Artifacts::default(),
            verifier_name: "peac-verify".to_string(),
            verifier_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Record a passing check.
    pub fn pass(&mut self, name: CheckName) -> &mut Self {
        self.checks.push(CheckEntry {
            name,
            status: CheckStatus::Pass,
            detail: None,
        });
        self
    }

    /// Record the failing check and mark every remaining check in
    /// [`CheckName::ORDER`] as `skip` -- the short-circuit semantics of
    /// `spec.md` §4.9. `reason` is the closed taxonomy value this failure
    /// maps to; it is echoed here as its wire string for per-check detail.
    pub fn fail(&mut self, name: CheckName, reason: Reason) -> &mut Self {
        self.checks.push(CheckEntry {
            name,
            status: CheckStatus::Fail,
            detail: Some(reason.as_str().to_string()),
        });
        let reported: std::collections::HashSet<CheckName> = self.checks.iter().map(|c| c.name).collect();
        for remaining in CheckName::ORDER.into_iter().filter(|n| !reported.contains(n)) {
            self.checks.push(CheckEntry {
                name: remaining,
                status: CheckStatus::Skip,
                detail: None,
            });
        }
        self
    }

    /// Record a check that is skipped for a documented reason without a
    /// prior failure (e.g. `policy.binding` on the current wire version,
    /// which always skips with `detail="wire_01_no_policy_digest"`).
    pub fn skip(&mut self, name: CheckName, detail: Option<&str>) -> &mut Self {
        self.checks.push(CheckEntry {
            name,
            status: CheckStatus::Skip,
            detail: detail.map(str::to_string),
        });
        self
    }

    pub fn artifacts_mut(&mut self) -> &mut Artifacts {
        &mut self.artifacts
    }

    fn finish(&self, result: VerificationResult) -> VerificationReport {
        let artifacts = if self.artifacts.is_empty() {
            None
        } else {
            Some(self.artifacts.clone())
        };
        VerificationReport {
            report_version: self.report_version.clone(),
            input: self.input.clone(),
            policy: self.policy.clone(),
            result,
            checks: self.checks.clone(),
            artifacts,
            meta: None,
        }
    }

    /// Full report: includes `meta` and every recorded artifact.
    pub fn build(&self, result: VerificationResult) -> VerificationReport {
        let mut report = self.finish(result);
        report.meta = Some(Meta {
            generated_at: Utc::now(),
            verifier_name: self.verifier_name.clone(),
            verifier_version: self.verifier_version.clone(),
        });
        report
    }

    /// Deterministic report: no `meta`, no non-deterministic artifacts.
    /// Two verifications of identical inputs produce byte-equal output
    /// regardless of wall-clock time or cache state.
    pub fn build_deterministic(&self, result: VerificationResult) -> VerificationReport {
        let mut report = self.finish(result);
        report.meta = None;
        report.artifacts = report.artifacts.map(|a| a.without_non_deterministic()).filter(|a| !a.is_empty());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PolicyEcho {
        PolicyEcho {
            mode: "network_allowed".to_string(),
            issuer_allowlist_count: 1,
        }
    }

    fn ok_result() -> VerificationResult {
        VerificationResult {
            valid: true,
            reason: Reason::Ok,
            severity: Severity::Info,
            receipt_type: "peac-receipt/01".to_string(),
            issuer: Some("https://api.example.com".to_string()),
            kid: Some("2025-01-15T10:30:00Z".to_string()),
            policy_binding: None,
        }
    }

    #[test]
    fn full_pass_sequence_has_no_skips() {
        let mut builder = ReportBuilder::new("1", InputEcho::default(), policy());
        for name in CheckName::ORDER {
            if name == CheckName::PolicyBinding {
                builder.skip(name, Some("wire_01_no_policy_digest"));
            } else {
                builder.pass(name);
            }
        }
        let report = builder.build(ok_result());
        assert_eq!(report.checks.len(), 12);
        assert!(report.checks.iter().all(|c| c.status != CheckStatus::Fail));
        assert!(report.meta.is_some());
    }

    /// S4: failing `claims.time_window` skips everything after it.
    #[test]
    fn failure_skips_remaining_checks_in_order() {
        let mut builder = ReportBuilder::new("1", InputEcho::default(), policy());
        builder.pass(CheckName::JwsParse);
        builder.pass(CheckName::LimitsReceiptBytes);
        builder.pass(CheckName::JwsProtectedHeader);
        builder.pass(CheckName::ClaimsSchemaUnverified);
        builder.pass(CheckName::IssuerTrustPolicy);
        builder.pass(CheckName::IssuerDiscovery);
        builder.pass(CheckName::KeyResolve);
        builder.pass(CheckName::JwsSignature);
        builder.fail(CheckName::ClaimsTimeWindow, Reason::Expired);

        let result = VerificationResult {
            valid: false,
            reason: Reason::Expired,
            ..ok_result()
        };
        let report = builder.build(result);

        assert_eq!(report.checks.len(), 12);
        let failed: Vec<_> = report.checks.iter().filter(|c| c.status == CheckStatus::Fail).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, CheckName::ClaimsTimeWindow);

        let fail_index = report
            .checks
            .iter()
            .position(|c| c.status == CheckStatus::Fail)
            .unwrap();
        assert!(report.checks[fail_index + 1..]
            .iter()
            .all(|c| c.status == CheckStatus::Skip));
    }

    /// S5: two builds at different wall-clock times produce equal
    /// deterministic output and omit `meta`.
    #[test]
    fn deterministic_build_excludes_meta_and_is_stable() {
        let mut builder = ReportBuilder::new("1", InputEcho::default(), policy());
        for name in CheckName::ORDER {
            if name == CheckName::PolicyBinding {
                builder.skip(name, Some("wire_01_no_policy_digest"));
            } else {
                builder.pass(name);
            }
        }
        builder.artifacts_mut().issuer_jwks_digest = Some("sha256:abc".to_string());
        builder.artifacts_mut().issuer_key_thumbprint = Some("thumb".to_string());

        let d1 = builder.build_deterministic(ok_result());
        let d2 = builder.build_deterministic(ok_result());

        assert_eq!(d1, d2);
        assert!(d1.meta.is_none());
        let artifacts = d1.artifacts.unwrap();
        assert!(artifacts.issuer_jwks_digest.is_none());
        assert_eq!(artifacts.issuer_key_thumbprint.as_deref(), Some("thumb"));
    }

    #[test]
    fn deterministic_build_omits_empty_artifacts_entirely() {
        let mut builder = ReportBuilder::new("1", InputEcho::default(), policy());
        for name in CheckName::ORDER {
            builder.pass(name);
        }
        builder.artifacts_mut().issuer_jwks_digest = Some("sha256:onlynondeterministic".to_string());
        let report = builder.build_deterministic(ok_result());
        assert!(report.artifacts.is_none());
    }
}
