use crate::{ReceiptIssuedEvent, ReceiptVerifiedEvent, TelemetryHook};
use async_trait::async_trait;
use std::sync::Mutex;

/// An in-memory hook that records every event it receives, for tests and
/// local development (mirrors the shape of an in-memory audit sink: no
/// I/O, just a vector behind a lock).
#[derive(Default)]
pub struct RecordingTelemetryHook {
    issued: Mutex<Vec<ReceiptIssuedEvent>>,
    verified: Mutex<Vec<ReceiptVerifiedEvent>>,
}

impl RecordingTelemetryHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issued(&self) -> Vec<ReceiptIssuedEvent> {
        self.issued.lock().unwrap().clone()
    }

    pub fn verified(&self) -> Vec<ReceiptVerifiedEvent> {
        self.verified.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelemetryHook for RecordingTelemetryHook {
    async fn on_receipt_issued(&self, event: ReceiptIssuedEvent) {
        self.issued.lock().unwrap().push(event);
    }

    async fn on_receipt_verified(&self, event: ReceiptVerifiedEvent) {
        self.verified.lock().unwrap().push(event);
    }
}

/// A hook that panics on every call, used to exercise the panic guard.
pub struct PanickingTelemetryHook;

#[async_trait]
impl TelemetryHook for PanickingTelemetryHook {
    async fn on_receipt_issued(&self, _event: ReceiptIssuedEvent) {
        panic!("telemetry sink exploded");
    }

    async fn on_receipt_verified(&self, _event: ReceiptVerifiedEvent) {
        panic!("telemetry sink exploded");
    }
}
