use std::{env, time::Duration};

use flutterwave_tools::FlutterwaveConfig;
use log::*;
use mkt_common::{parse_boolean_flag, MinorUnits, Secret, DEFAULT_CURRENCY_CODE};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use settlement_engine::{EngineSettings, DEFAULT_GATEWAY_TIMEOUT, DEFAULT_MINIMUM_WITHDRAWAL};

use crate::errors::ServerError;

const DEFAULT_MKT_HOST: &str = "127.0.0.1";
const DEFAULT_MKT_PORT: u16 = 8480;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/marketplace.db";
const DEFAULT_PAYOUT_POLL_INTERVAL: Duration = Duration::from_secs(300);
const DEFAULT_PAYMENT_REDIRECT_URL: &str = "http://localhost:3000/checkout/complete";
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// The single settlement currency.
    pub currency: String,
    /// The smallest withdrawal a seller may request.
    pub minimum_withdrawal: MinorUnits,
    /// Bound on every call to the payment provider.
    pub gateway_timeout: Duration,
    /// How often PROCESSING payouts are polled at the provider. `None` disables the poller.
    pub payout_poll_interval: Option<Duration>,
    /// Where the provider sends the shopper after the hosted payment page.
    pub payment_redirect_url: String,
    /// If true, the access log records the client address from the `Forwarded` or `X-Forwarded-For` headers rather
    /// than the peer address. Only enable this behind a proxy that sets those headers.
    pub use_x_forwarded_for: bool,
    pub flutterwave: FlutterwaveConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MKT_HOST.to_string(),
            port: DEFAULT_MKT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            minimum_withdrawal: MinorUnits::from(DEFAULT_MINIMUM_WITHDRAWAL),
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            payout_poll_interval: Some(DEFAULT_PAYOUT_POLL_INTERVAL),
            payment_redirect_url: DEFAULT_PAYMENT_REDIRECT_URL.to_string(),
            use_x_forwarded_for: false,
            flutterwave: FlutterwaveConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MKT_HOST").ok().unwrap_or_else(|| DEFAULT_MKT_HOST.into());
        let port = env::var("MKT_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MKT_PORT. {e} Using the default, {DEFAULT_MKT_PORT}, instead."
                    );
                    DEFAULT_MKT_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MKT_PORT);
        let database_url = env::var("MKT_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MKT_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let currency = env::var("MKT_CURRENCY")
            .map(|s| s.trim().to_uppercase())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        let minimum_withdrawal = env::var("MKT_MIN_WITHDRAWAL")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for MKT_MIN_WITHDRAWAL. {e}"))
                    .ok()
            })
            .map(MinorUnits::from)
            .unwrap_or_else(|| MinorUnits::from(DEFAULT_MINIMUM_WITHDRAWAL));
        let gateway_timeout = seconds_from_env("MKT_GATEWAY_TIMEOUT").unwrap_or(DEFAULT_GATEWAY_TIMEOUT);
        let payout_poll_interval = match seconds_from_env("MKT_PAYOUT_POLL_INTERVAL") {
            Some(d) if d.is_zero() => {
                info!("🪛️ MKT_PAYOUT_POLL_INTERVAL is 0. Payouts will only be reconciled via webhooks.");
                None
            },
            Some(d) => Some(d),
            None => Some(DEFAULT_PAYOUT_POLL_INTERVAL),
        };
        let payment_redirect_url = env::var("MKT_PAYMENT_REDIRECT_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MKT_PAYMENT_REDIRECT_URL is not set. Using {DEFAULT_PAYMENT_REDIRECT_URL}.");
            DEFAULT_PAYMENT_REDIRECT_URL.to_string()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("MKT_USE_X_FORWARDED_FOR").ok(), false);
        let mut flutterwave = FlutterwaveConfig::new_from_env_or_default();
        flutterwave.timeout = gateway_timeout;
        Self {
            host,
            port,
            database_url,
            auth,
            currency,
            minimum_withdrawal,
            gateway_timeout,
            payout_poll_interval,
            payment_redirect_url,
            use_x_forwarded_for,
            flutterwave,
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings::default()
            .with_currency(self.currency.clone())
            .with_minimum_withdrawal(self.minimum_withdrawal)
            .with_gateway_timeout(self.gateway_timeout)
    }
}

fn seconds_from_env(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().map_err(|e| warn!("🪛️ Invalid configuration value for {name}. {e}")).ok())
        .map(Duration::from_secs)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 key that access tokens are signed with. It is shared with the identity service that issues them.
    pub jwt_secret: Secret<String>,
    /// Lifetime of tokens issued by [`crate::auth::TokenIssuer`].
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No token issued \
             elsewhere will be accepted. DO NOT operate on production like this. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(jwt_secret: S) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.into()), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("MKT_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [MKT_JWT_SECRET]")))?;
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError(
                "MKT_JWT_SECRET must be at least 32 characters long".to_string(),
            ));
        }
        Ok(Self::new(secret))
    }
}
