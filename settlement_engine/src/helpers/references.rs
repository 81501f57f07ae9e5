//! Identifiers handed out to orders and payouts.
//!
//! Payment and payout references double as idempotency keys at the provider, so they must be unique. The random
//! suffix gives 36^8 possibilities per day (or per millisecond, for payment references), and the database enforces
//! uniqueness regardless.
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

fn random_suffix(len: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(|c| char::from(c).to_ascii_uppercase()).collect()
}

/// A human-friendly order number, e.g. `ORD-20241017-7K2M9QXA`
pub fn new_order_number() -> String {
    format!("ORD-{}-{}", Utc::now().format("%Y%m%d"), random_suffix(8))
}

/// The reference the payment provider will echo back for a charge, e.g. `MKT-1729152000123-R8D2KQ4Z`
pub fn new_payment_reference() -> String {
    format!("MKT-{}-{}", Utc::now().timestamp_millis(), random_suffix(8))
}

/// The reference the payment provider will echo back for a transfer, e.g. `PAY-20241017-3XQ8NF0L`
pub fn new_payout_reference() -> String {
    format!("PAY-{}-{}", Utc::now().format("%Y%m%d"), random_suffix(8))
}
