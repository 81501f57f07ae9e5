//! Webhook signature checks.
//!
//! Flutterwave signs webhooks in one of two ways, depending on how the account's webhook is configured:
//! * `verif-hash`: the header simply carries the secret hash configured on the dashboard.
//! * `flutterwave-signature`: the base64-encoded HMAC-SHA256 of the raw request body, keyed with the same secret.
//!
//! Both checks run on the raw body bytes, before anything is deserialized.
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

use crate::SignatureMode;

pub const VERIF_HASH_HEADER: &str = "verif-hash";
pub const HMAC_SIGNATURE_HEADER: &str = "flutterwave-signature";

type HmacSha256 = Hmac<Sha256>;

/// Base64-encoded HMAC-SHA256 of `data`.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(data);
            base64::encode(mac.finalize().into_bytes())
        },
        Err(e) => {
            error!("🔐️ Could not key the webhook HMAC: {e}");
            String::new()
        },
    }
}

/// An unset secret validates nothing.
pub fn validate_signature(mode: SignatureMode, secret: &str, raw_body: &[u8], signature: &str) -> bool {
    if secret.is_empty() || signature.is_empty() {
        return false;
    }
    match mode {
        SignatureMode::Hash => signature == secret,
        SignatureMode::Hmac => {
            let Ok(expected) = base64::decode(signature.trim()) else {
                trace!("🔐️ Webhook signature is not valid base64");
                return false;
            };
            match HmacSha256::new_from_slice(secret.as_bytes()) {
                Ok(mut mac) => {
                    mac.update(raw_body);
                    mac.verify_slice(&expected).is_ok()
                },
                Err(_) => false,
            }
        },
    }
}
