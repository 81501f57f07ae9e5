mod account_validation;
mod gateway_timeout;
mod references;

pub use account_validation::validate_account_details;
pub use gateway_timeout::with_gateway_timeout;
pub use references::{new_order_number, new_payment_reference, new_payout_reference};
