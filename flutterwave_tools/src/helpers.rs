use mkt_common::MinorUnits;

use crate::FlutterwaveApiError;

/// Flutterwave expresses amounts as decimal numbers of major units.
pub fn major_amount(amount: MinorUnits) -> f64 {
    amount.to_major_f64()
}

pub fn minor_amount(major: f64) -> Result<MinorUnits, FlutterwaveApiError> {
    MinorUnits::from_major_f64(major).map_err(|e| FlutterwaveApiError::InvalidCurrencyAmount(e.to_string()))
}
