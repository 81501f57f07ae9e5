use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    db_types::{AccountDetails, PayoutMethod},
    traits::PayoutError,
};

type Pattern = Lazy<Result<Regex, regex::Error>>;

static BANK_CODE: Pattern = Lazy::new(|| Regex::new(r"^\d{3,6}$"));
static ACCOUNT_NUMBER: Pattern = Lazy::new(|| Regex::new(r"^\d{6,20}$"));
static NETWORK: Pattern = Lazy::new(|| Regex::new(r"^[A-Za-z]{2,12}$"));
static PHONE_NUMBER: Pattern = Lazy::new(|| Regex::new(r"^\+?\d{9,15}$"));
const MAX_NAME_LENGTH: usize = 100;

fn check(field: &str, value: Option<&str>, pattern: &Pattern) -> Result<(), PayoutError> {
    let re = Lazy::force(pattern).as_ref().map_err(|e| PayoutError::InvalidAccountDetails(e.to_string()))?;
    match value.map(str::trim) {
        None | Some("") => Err(PayoutError::InvalidAccountDetails(format!("{field} is required"))),
        Some(v) if re.is_match(v) => Ok(()),
        Some(v) => Err(PayoutError::InvalidAccountDetails(format!("{field} '{v}' is not valid"))),
    }
}

/// Checks that the account details carry everything the payout method needs, and that each field is well formed.
pub fn validate_account_details(method: PayoutMethod, details: &AccountDetails) -> Result<(), PayoutError> {
    let name = details.account_name.trim();
    if name.is_empty() {
        return Err(PayoutError::InvalidAccountDetails("accountName is required".into()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(PayoutError::InvalidAccountDetails("accountName is too long".into()));
    }
    match method {
        PayoutMethod::BankTransfer => {
            check("bankCode", details.bank_code.as_deref(), &BANK_CODE)?;
            check("accountNumber", details.account_number.as_deref(), &ACCOUNT_NUMBER)
        },
        PayoutMethod::MobileMoney => {
            check("network", details.network.as_deref(), &NETWORK)?;
            check("phoneNumber", details.phone_number.as_deref(), &PHONE_NUMBER)
        },
    }
}
