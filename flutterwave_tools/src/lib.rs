//! A client for the parts of the Flutterwave v3 API that the settlement service needs: hosted charge
//! initialization, transaction verification, transfers and webhook handling.
//!
//! Amounts cross this crate's boundary as [`mkt_common::MinorUnits`]. Flutterwave itself works in decimal major
//! units, and the conversion happens here.
mod api;
mod config;
mod data_objects;
mod error;
mod helpers;
mod signature;
mod webhook;

pub use api::FlutterwaveApi;
pub use config::{FlutterwaveConfig, SignatureMode};
pub use data_objects::{
    ChargeCustomer,
    ChargeCustomizations,
    FlwResponse,
    HostedLink,
    NewCharge,
    NewTransfer,
    Transaction,
    Transfer,
};
pub use error::FlutterwaveApiError;
pub use helpers::{major_amount, minor_amount};
pub use signature::{calculate_hmac, validate_signature, HMAC_SIGNATURE_HEADER, VERIF_HASH_HEADER};
pub use webhook::{WebhookData, WebhookPayload, CHARGE_COMPLETED, TRANSFER_COMPLETED};
