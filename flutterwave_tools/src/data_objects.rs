use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::FlutterwaveApiError;

/// Every Flutterwave v3 response is wrapped in this envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlwResponse<T> {
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> FlwResponse<T> {
    /// The payload, if Flutterwave reported success.
    pub fn into_data(self) -> Result<T, FlutterwaveApiError> {
        if self.status != "success" {
            return Err(FlutterwaveApiError::Unsuccessful(self.message));
        }
        self.data.ok_or_else(|| FlutterwaveApiError::JsonError(format!("Response has no data. {}", self.message)))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChargeCustomer {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonenumber: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChargeCustomizations {
    pub title: String,
    pub description: String,
}

/// Body of `POST /v3/payments`, which creates a hosted payment link.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NewCharge {
    pub tx_ref: String,
    pub amount: f64,
    pub currency: String,
    pub redirect_url: String,
    pub customer: ChargeCustomer,
    pub customizations: ChargeCustomizations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostedLink {
    pub link: String,
}

/// A charge, as returned by transaction verification and carried by `charge.completed` webhooks.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Transaction {
    pub id: u64,
    pub tx_ref: String,
    #[serde(default)]
    pub flw_ref: Option<String>,
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub charged_amount: Option<f64>,
    /// `successful`, `failed` or `pending`
    pub status: String,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /v3/transfers`.
///
/// For mobile money, `account_bank` carries the network code and `account_number` the phone number.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NewTransfer {
    pub account_bank: String,
    pub account_number: String,
    pub amount: f64,
    pub currency: String,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

/// A transfer, as returned by the transfer endpoints and carried by `transfer.completed` webhooks.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Transfer {
    pub id: u64,
    /// Our reference, echoed back
    pub reference: String,
    pub amount: f64,
    pub currency: String,
    /// `NEW`, `PENDING`, `SUCCESSFUL` or `FAILED`
    pub status: String,
    #[serde(default)]
    pub complete_message: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub bank_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
