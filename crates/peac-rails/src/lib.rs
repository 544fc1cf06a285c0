//! Rail adapter contract (`spec.md` §4.11): a pure `parse -> validate ->
//! map` pipeline that turns an external payment-rail or AI-inference
//! event into [`peac_claims::PaymentEvidenceInput`], without ever
//! panicking. [`stripe`] and [`inference`] are two concrete instances;
//! a collaborator adds further rails by implementing [`RailAdapter`]
//! without touching this contract.

#![deny(unsafe_code)]

mod error;
pub mod inference;
pub mod stripe;

pub use error::{AdapterError, AdapterErrorKind};
pub use inference::InferenceAdapter;
pub use stripe::StripeAdapter;

use peac_claims::PaymentEvidenceInput;

/// A rail adapter is three total functions. None of them may panic:
/// every unknown input produces a `Result`, never an abort.
pub trait RailAdapter {
    type Event;
    type Config: Default;

    /// Shape check and type coercion from an untyped tree value.
    fn parse(raw: &serde_json::Value) -> Result<Self::Event, AdapterError>;

    /// Domain checks (allow-listed provider, amount/currency format).
    /// Returns the event unchanged on success so callers can chain.
    fn validate(event: Self::Event, config: &Self::Config) -> Result<Self::Event, AdapterError>;

    /// Construct the evidence record: upper-cased currency, default
    /// environment, fixed rail identifier.
    fn map(event: Self::Event, config: &Self::Config) -> PaymentEvidenceInput;

    /// Run the full pipeline. Provided so callers don't have to thread
    /// the three stages together by hand.
    fn run(raw: &serde_json::Value, config: &Self::Config) -> Result<PaymentEvidenceInput, AdapterError> {
        let event = Self::parse(raw)?;
        let event = Self::validate(event, config)?;
        Ok(Self::map(event, config))
    }
}
