//! Provider-neutral view of the external payment provider.
//!
//! Implementations own all request/response shaping for their provider and never touch order or payout state.
use mkt_common::MinorUnits;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::Payout;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("The payment provider did not respond in time")]
    Timeout,
    #[error("Could not reach the payment provider: {0}")]
    Transport(String),
    #[error("The payment provider rejected the request: {0}")]
    Rejected(String),
    #[error("Unexpected response from the payment provider: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Transient failures leave the outcome of the request unknown. Retrying is safe.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transport(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub reference: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub customer_id: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeSession {
    pub payment_url: String,
    pub reference: String,
}

/// What the provider says happened to a charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    /// Our payment reference (`tx_ref`), the join key back to the order.
    pub reference: String,
    /// The provider's id for the transaction.
    pub transaction_id: String,
    pub amount: MinorUnits,
    pub currency: String,
    /// The provider's status vocabulary, unmapped.
    pub reported_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutSubmission {
    pub external_id: String,
    pub reported_status: String,
}

/// What the provider says happened to a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutOutcome {
    /// Our payout reference, echoed back by the provider.
    pub reference: String,
    pub external_id: Option<String>,
    pub reported_status: String,
    pub message: Option<String>,
}

impl PayoutOutcome {
    pub fn with_status(reference: &str, reported_status: &str) -> Self {
        Self {
            reference: reference.to_string(),
            external_id: None,
            reported_status: reported_status.to_string(),
            message: None,
        }
    }

    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A signature-checked, decoded webhook notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEvent {
    Charge(PaymentOutcome),
    Transfer(PayoutOutcome),
    /// An event type this service does not act on. Holds the provider's event name.
    Ignored(String),
}

#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// Creates a hosted payment session for the charge.
    async fn initialize(&self, request: &ChargeRequest) -> Result<ChargeSession, GatewayError>;

    /// Asks the provider for the current state of the transaction with the provider-side id `transaction_id`.
    async fn verify(&self, transaction_id: &str) -> Result<PaymentOutcome, GatewayError>;

    /// Checks the webhook signature header against the server-held secret. Must be evaluated before the body is
    /// trusted in any way.
    fn validate_webhook_signature(&self, raw_body: &[u8], signature: &str) -> bool;

    /// Decodes a webhook body. Only call this once the signature has been validated.
    fn parse_webhook(&self, raw_body: &[u8]) -> Result<WebhookEvent, GatewayError>;
}

#[allow(async_fn_in_trait)]
pub trait PayoutGateway: Clone {
    /// Submits the transfer. `Err(GatewayError::Rejected)` means the provider refused it and no money will move.
    async fn submit_payout(&self, payout: &Payout) -> Result<PayoutSubmission, GatewayError>;

    /// Polls the provider for the state of a previously submitted transfer.
    async fn fetch_payout_outcome(&self, payout: &Payout) -> Result<PayoutOutcome, GatewayError>;
}
