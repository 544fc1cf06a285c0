//! Generic AI-inference-provider usage event adapter (`spec.md` §1,
//! "AI-inference providers").

use crate::error::AdapterError;
use crate::RailAdapter;
use peac_claims::{PaymentEnv, PaymentEvidenceInput};

/// A parsed usage event from an inference provider: `units` consumed at
/// `unit_price_minor` (minor currency units, e.g. cents) each.
#[derive(Clone, Debug, PartialEq)]
pub struct InferenceEvent {
    pub request_id: String,
    pub units: u64,
    pub unit_price_minor: u64,
    pub currency: String,
    pub provider: String,
}

/// An empty allow-list means every provider is accepted.
#[derive(Clone, Debug, Default)]
pub struct InferenceConfig {
    pub allowed_providers: Vec<String>,
}

pub struct InferenceAdapter;

impl RailAdapter for InferenceAdapter {
    type Event = InferenceEvent;
    type Config = InferenceConfig;

    fn parse(raw: &serde_json::Value) -> Result<InferenceEvent, AdapterError> {
        let request_id = raw
            .get("request_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AdapterError::missing("request_id"))?
            .to_string();
        let units = raw
            .get("units")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| AdapterError::invalid_format("units", "must be a non-negative integer"))?;
        let unit_price_minor = raw
            .get("unit_price_minor")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| AdapterError::invalid_format("unit_price_minor", "must be a non-negative integer"))?;
        let currency = raw
            .get("currency")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AdapterError::missing("currency"))?
            .to_string();
        let provider = raw
            .get("provider")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AdapterError::missing("provider"))?
            .to_string();
        Ok(InferenceEvent {
            request_id,
            units,
            unit_price_minor,
            currency,
            provider,
        })
    }

    fn validate(event: InferenceEvent, config: &InferenceConfig) -> Result<InferenceEvent, AdapterError> {
        if event.request_id.trim().is_empty() {
            return Err(AdapterError::validation("request_id", "must not be empty"));
        }
        if event.currency.trim().chars().count() != 3 {
            return Err(AdapterError::invalid_format(
                "currency",
                format!("must be a three-letter code, got '{}'", event.currency),
            ));
        }
        if !config.allowed_providers.is_empty() && !config.allowed_providers.iter().any(|p| p == &event.provider) {
            return Err(AdapterError::validation(
                "provider",
                format!("'{}' is not an allow-listed provider", event.provider),
            ));
        }
        Ok(event)
    }

    fn map(event: InferenceEvent, _config: &InferenceConfig) -> PaymentEvidenceInput {
        let currency = event.currency.to_uppercase();
        let amount = event.units.saturating_mul(event.unit_price_minor);
        PaymentEvidenceInput {
            rail: "inference".to_string(),
            reference: event.request_id,
            amount,
            currency: currency.clone(),
            asset: Some(currency),
            env: Some(PaymentEnv::Test),
            evidence: None,
            network: None,
            facilitator_ref: Some(event.provider),
            idempotency_key: None,
            metadata: None,
        }
    }
}
