use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{FlutterwaveApiError, Transaction, Transfer};

pub const CHARGE_COMPLETED: &str = "charge.completed";
pub const TRANSFER_COMPLETED: &str = "transfer.completed";

/// The outer shape of every webhook Flutterwave sends. Only decode this once the signature has been checked.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookPayload {
    pub event: String,
    #[serde(rename = "event.type", default)]
    pub event_type: Option<String>,
    pub data: Value,
}

#[derive(Debug, Clone)]
pub enum WebhookData {
    Charge(Transaction),
    Transfer(Transfer),
    /// Any other event, by name
    Other(String),
}

impl WebhookPayload {
    pub fn from_slice(raw_body: &[u8]) -> Result<Self, FlutterwaveApiError> {
        serde_json::from_slice(raw_body).map_err(|e| FlutterwaveApiError::JsonError(e.to_string()))
    }

    pub fn decode(self) -> Result<WebhookData, FlutterwaveApiError> {
        let Self { event, data, .. } = self;
        let invalid = |e: serde_json::Error| FlutterwaveApiError::JsonError(format!("Invalid {event} payload. {e}"));
        match event.as_str() {
            CHARGE_COMPLETED => serde_json::from_value(data).map(WebhookData::Charge).map_err(invalid),
            TRANSFER_COMPLETED => serde_json::from_value(data).map(WebhookData::Transfer).map_err(invalid),
            other => Ok(WebhookData::Other(other.to_string())),
        }
    }
}
