//! The settlement engine's public API.
//!
//! Each API object wraps a storage backend (and, where it needs one, a gateway adapter) that is passed in explicitly.
//! None of them hold state of their own, so any number of instances, in any number of processes, can run against the
//! same database.
pub mod checkout_api;
pub mod ledger_api;
pub mod order_objects;
pub mod outcomes;
pub mod payout_api;
pub mod payout_objects;
pub mod reconciliation_api;
pub mod settings;
