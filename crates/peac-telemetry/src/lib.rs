//! Telemetry hook (`spec.md` §1, "the core exposes pure functions plus a
//! telemetry hook"; §5, "Telemetry"). [`notify_issued`]/[`notify_verified`]
//! spawn the hook and never await it: any panic inside the hook, or the
//! spawned task failing for any other reason, is caught and discarded.
//! Telemetry can never affect the result of an issue/verify call.

#![deny(unsafe_code)]

mod hash;
mod recording;

pub use hash::hash_identifier;
pub use recording::{PanickingTelemetryHook, RecordingTelemetryHook};

use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Emitted once an issuance completes. Identifiers are pre-hashed by the
/// caller via [`hash_identifier`] -- this crate never sees raw claim
/// data, only what the caller chooses to pass in.
#[derive(Clone, Debug)]
pub struct ReceiptIssuedEvent {
    pub rid: String,
    pub issuer_hash: String,
    pub kid_hash: String,
}

/// Emitted once a verification completes.
#[derive(Clone, Debug)]
pub struct ReceiptVerifiedEvent {
    pub reason: String,
    pub issuer_hash: Option<String>,
    pub kid_hash: Option<String>,
}

/// A telemetry sink. Hooks must assume they run after the triggering
/// call has already returned to its caller.
#[async_trait]
pub trait TelemetryHook: Send + Sync {
    async fn on_receipt_issued(&self, event: ReceiptIssuedEvent);
    async fn on_receipt_verified(&self, event: ReceiptVerifiedEvent);
}

/// A hook that does nothing, for callers with no telemetry collector.
pub struct NoopTelemetryHook;

#[async_trait]
impl TelemetryHook for NoopTelemetryHook {
    async fn on_receipt_issued(&self, _event: ReceiptIssuedEvent) {}
    async fn on_receipt_verified(&self, _event: ReceiptVerifiedEvent) {}
}

/// Fire `on_receipt_issued` without waiting for it. Spawns onto the
/// caller's runtime; the synchronous caller continues immediately.
pub fn notify_issued(hook: Arc<dyn TelemetryHook>, event: ReceiptIssuedEvent) {
    tokio::spawn(async move {
        if AssertUnwindSafe(hook.on_receipt_issued(event)).catch_unwind().await.is_err() {
            tracing::debug!("telemetry hook panicked on_receipt_issued");
        }
    });
}

/// Fire `on_receipt_verified` without waiting for it.
pub fn notify_verified(hook: Arc<dyn TelemetryHook>, event: ReceiptVerifiedEvent) {
    tokio::spawn(async move {
        if AssertUnwindSafe(hook.on_receipt_verified(event)).catch_unwind().await.is_err() {
            tracing::debug!("telemetry hook panicked on_receipt_verified");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_hook_observes_fired_events() {
        let hook = Arc::new(RecordingTelemetryHook::new());
        notify_issued(
            hook.clone(),
            ReceiptIssuedEvent {
                rid: "01234567-0000-7000-8000-000000000000".to_string(),
                issuer_hash: hash_identifier("https://issuer.example.com"),
                kid_hash: hash_identifier("k1"),
            },
        );
        notify_verified(
            hook.clone(),
            ReceiptVerifiedEvent {
                reason: "ok".to_string(),
                issuer_hash: Some(hash_identifier("https://issuer.example.com")),
                kid_hash: Some(hash_identifier("k1")),
            },
        );

        // Fire-and-forget: give the spawned tasks a chance to run.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(hook.issued().len(), 1);
        assert_eq!(hook.verified().len(), 1);
    }

    /// A panicking hook must never propagate -- the call that triggered
    /// telemetry already returned, and the spawned task simply vanishes.
    #[tokio::test]
    async fn panicking_hook_is_contained() {
        let hook = Arc::new(PanickingTelemetryHook);
        notify_issued(
            hook,
            ReceiptIssuedEvent {
                rid: "r".to_string(),
                issuer_hash: "sha256:0000000000000000".to_string(),
                kid_hash: "sha256:0000000000000000".to_string(),
            },
        );
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn noop_hook_accepts_events_without_recording() {
        let hook = Arc::new(NoopTelemetryHook);
        notify_verified(
            hook,
            ReceiptVerifiedEvent {
                reason: "expired".to_string(),
                issuer_hash: None,
                kid_hash: None,
            },
        );
        tokio::task::yield_now().await;
    }
}
