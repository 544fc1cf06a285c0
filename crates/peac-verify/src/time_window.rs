use peac_report::Reason;

/// Pure time-window evaluation, factored out of the pipeline so it can be
/// exercised directly without a live issuer endpoint (`spec.md` §4.9
/// `claims.time_window`).
pub fn evaluate_time_window(iat: i64, exp: Option<i64>, now: i64, skew_s: i64) -> Option<Reason> {
    if let Some(exp) = exp {
        if now > exp + skew_s {
            return Some(Reason::Expired);
        }
    }
    if iat > now + skew_s {
        return Some(Reason::NotYetValid);
    }
    None
}
