use std::{fmt::Display, str::FromStr, time::Duration};

use log::*;
use mkt_common::Secret;

pub const DEFAULT_FLW_BASE_URL: &str = "https://api.flutterwave.com";
pub const DEFAULT_FLW_TIMEOUT: Duration = Duration::from_secs(30);

/// How webhook signatures are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureMode {
    /// The `verif-hash` header must equal the webhook secret.
    #[default]
    Hash,
    /// The `flutterwave-signature` header must be the base64 HMAC-SHA256 of the raw body, keyed by the webhook secret.
    Hmac,
}

impl FromStr for SignatureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(Self::Hash),
            "hmac" => Ok(Self::Hmac),
            other => Err(format!("Unknown signature mode '{other}'. Use 'hash' or 'hmac'")),
        }
    }
}

impl Display for SignatureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash => write!(f, "hash"),
            Self::Hmac => write!(f, "hmac"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlutterwaveConfig {
    pub base_url: String,
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    pub signature_mode: SignatureMode,
    /// Bounds every HTTP request made by the client.
    pub timeout: Duration,
}

impl Default for FlutterwaveConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FLW_BASE_URL.to_string(),
            secret_key: Secret::default(),
            webhook_secret: Secret::default(),
            signature_mode: SignatureMode::default(),
            timeout: DEFAULT_FLW_TIMEOUT,
        }
    }
}

impl FlutterwaveConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("MKT_FLW_BASE_URL").unwrap_or_else(|_| {
            info!("🪛️ MKT_FLW_BASE_URL not set, using {DEFAULT_FLW_BASE_URL}");
            DEFAULT_FLW_BASE_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("MKT_FLW_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ MKT_FLW_SECRET_KEY not set. Calls to Flutterwave will be refused.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("MKT_FLW_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ MKT_FLW_WEBHOOK_SECRET not set. Every webhook will be rejected.");
            String::default()
        }));
        let signature_mode = std::env::var("MKT_FLW_SIGNATURE_MODE")
            .ok()
            .and_then(|s| {
                s.parse::<SignatureMode>()
                    .map_err(|e| warn!("🪛️ Invalid MKT_FLW_SIGNATURE_MODE. {e}. Using the default."))
                    .ok()
            })
            .unwrap_or_default();
        let timeout = std::env::var("MKT_GATEWAY_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_FLW_TIMEOUT);
        Self { base_url, secret_key, webhook_secret, signature_mode, timeout }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_webhook_secret<S: Into<String>>(mut self, secret: S, mode: SignatureMode) -> Self {
        self.webhook_secret = Secret::new(secret.into());
        self.signature_mode = mode;
        self
    }
}
