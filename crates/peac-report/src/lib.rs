//! Verification report construction (`spec.md` §4.10).
//!
//! [`ReportBuilder`] accumulates the fixed, ordered check list and
//! produces either a [`ReportBuilder::build`] (full, includes `meta` and
//! every artifact) or a [`ReportBuilder::build_deterministic`] report
//! (no `meta`, no non-deterministic artifacts) so that two verifications
//! of identical inputs compare equal regardless of wall-clock time or
//! cache state.

#![deny(unsafe_code)]

mod artifacts;
mod checks;
mod reason;
mod report;

pub use artifacts::{Artifacts, KeySource, ReceiptPointer};
pub use checks::{CheckEntry, CheckName, CheckStatus};
pub use reason::{Reason, Severity};
pub use report::{InputEcho, Meta, PolicyEcho, ReportBuilder, VerificationReport, VerificationResult};
