use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Error returned when the inflight-verification bound is exceeded
/// (`spec.md` §5, "Backpressure & saturation"). Distinct from
/// [`peac_report::Reason`] -- this is admission control, not a
/// verification outcome, so no report is produced at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("verifier_busy")]
pub struct VerifierBusy;

/// Bounds the number of concurrent verifications. The only admission
/// control in the core; everything else (rate limiting) is external.
pub struct AdmissionGuard {
    inflight: Arc<AtomicUsize>,
    max_inflight: usize,
}

impl AdmissionGuard {
    pub fn new(max_inflight: usize) -> Self {
        Self {
            inflight: Arc::new(AtomicUsize::new(0)),
            max_inflight,
        }
    }

    /// Admit one verification, returning a RAII permit that decrements the
    /// counter on drop, or [`VerifierBusy`] if the bound is already hit.
    pub fn admit(&self) -> Result<InflightPermit, VerifierBusy> {
        let previous = self.inflight.fetch_add(1, Ordering::SeqCst);
        if previous >= self.max_inflight {
            self.inflight.fetch_sub(1, Ordering::SeqCst);
            return Err(VerifierBusy);
        }
        Ok(InflightPermit {
            inflight: Arc::clone(&self.inflight),
        })
    }
}

pub struct InflightPermit {
    inflight: Arc<AtomicUsize>,
}

impl Drop for InflightPermit {
    fn drop(&mut self) {
        self.inflight.fetch_sub(1, Ordering::SeqCst);
    }
}
