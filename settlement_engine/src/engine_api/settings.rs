use std::time::Duration;

use mkt_common::{MinorUnits, DEFAULT_CURRENCY_CODE};

pub const DEFAULT_MINIMUM_WITHDRAWAL: i64 = 100_000;
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RECENT_PAYOUTS: i64 = 10;

/// Knobs shared by the engine APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// The single currency orders and payouts are denominated in.
    pub currency: String,
    /// The smallest amount a seller may withdraw, in minor units.
    pub minimum_withdrawal: MinorUnits,
    /// Upper bound on every call to the payment provider.
    pub gateway_timeout: Duration,
    /// How many payouts the wallet summary lists.
    pub recent_payouts: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            minimum_withdrawal: MinorUnits::from(DEFAULT_MINIMUM_WITHDRAWAL),
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            recent_payouts: DEFAULT_RECENT_PAYOUTS,
        }
    }
}

impl EngineSettings {
    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_minimum_withdrawal(mut self, minimum: MinorUnits) -> Self {
        self.minimum_withdrawal = minimum;
        self
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }
}
