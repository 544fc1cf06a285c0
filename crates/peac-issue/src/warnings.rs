use std::collections::HashSet;
use std::sync::Mutex;

/// Tracks which subject ids have already produced a PII advisory so a
/// long-lived issuer only emits one warning per id rather than one per
/// receipt (`spec.md` §5: "one-per-id deduplicated").
#[derive(Default)]
pub struct PiiWarningTracker {
    seen: Mutex<HashSet<String>>,
}

impl PiiWarningTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `id` is seen, `false` on every
    /// subsequent call.
    pub fn should_warn(&self, id: &str) -> bool {
        let mut seen = self.seen.lock().expect("PII warning tracker lock poisoned");
        seen.insert(id.to_string())
    }
}
