/// Verification-time limits with the recommended defaults from
/// `spec.md` §6.4.
#[derive(Clone, Copy, Debug)]
pub struct VerifyLimits {
    pub max_receipt_bytes: usize,
    pub max_extension_bytes: usize,
    pub clock_skew_s: i64,
    pub max_inflight: usize,
}

impl Default for VerifyLimits {
    fn default() -> Self {
        Self {
            max_receipt_bytes: 16 * 1024,
            max_extension_bytes: 4 * 1024,
            clock_skew_s: 120,
            max_inflight: 128,
        }
    }
}
