//! Stripe Checkout `checkout.session.completed` style event adapter.

use crate::error::AdapterError;
use crate::RailAdapter;
use peac_claims::{PaymentEnv, PaymentEvidenceInput};
use std::collections::BTreeMap;

/// A parsed Stripe Checkout session-completed event.
#[derive(Clone, Debug, PartialEq)]
pub struct StripeEvent {
    pub id: String,
    pub amount_total: u64,
    pub currency: String,
    pub payment_status: String,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Which `payment_status` values `validate` accepts. Stripe's own set is
/// `{paid, unpaid, no_payment_required}`; only `paid` is evidence of an
/// actual payment.
#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub allowed_statuses: Vec<String>,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            allowed_statuses: vec!["paid".to_string()],
        }
    }
}

pub struct StripeAdapter;

impl RailAdapter for StripeAdapter {
    type Event = StripeEvent;
    type Config = StripeConfig;

    fn parse(raw: &serde_json::Value) -> Result<StripeEvent, AdapterError> {
        let id = raw
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AdapterError::missing("id"))?
            .to_string();
        let amount_total = raw
            .get("amount_total")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| AdapterError::invalid_format("amount_total", "must be a non-negative integer"))?;
        let currency = raw
            .get("currency")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AdapterError::missing("currency"))?
            .to_string();
        let payment_status = raw
            .get("payment_status")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AdapterError::missing("payment_status"))?
            .to_string();
        let metadata = match raw.get("metadata") {
            Some(serde_json::Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Some(_) => return Err(AdapterError::invalid_format("metadata", "must be an object")),
            None => BTreeMap::new(),
        };
        Ok(StripeEvent {
            id,
            amount_total,
            currency,
            payment_status,
            metadata,
        })
    }

    fn validate(event: StripeEvent, config: &StripeConfig) -> Result<StripeEvent, AdapterError> {
        if event.id.trim().is_empty() {
            return Err(AdapterError::validation("id", "must not be empty"));
        }
        if event.currency.trim().chars().count() != 3 {
            return Err(AdapterError::invalid_format(
                "currency",
                format!("must be a three-letter code, got '{}'", event.currency),
            ));
        }
        if !config.allowed_statuses.iter().any(|s| s == &event.payment_status) {
            return Err(AdapterError::validation(
                "payment_status",
                format!("'{}' is not an allowed status", event.payment_status),
            ));
        }
        Ok(event)
    }

    fn map(event: StripeEvent, _config: &StripeConfig) -> PaymentEvidenceInput {
        let currency = event.currency.to_uppercase();
        PaymentEvidenceInput {
            rail: "stripe".to_string(),
            reference: event.id,
            amount: event.amount_total,
            currency: currency.clone(),
            asset: Some(currency),
            env: Some(PaymentEnv::Test),
            evidence: Some(event.metadata),
            network: None,
            facilitator_ref: Some("stripe".to_string()),
            idempotency_key: None,
            metadata: None,
        }
    }
}
