//! Marketplace Settlement Engine
//!
//! This library holds the payment settlement and seller-payout pipeline of the marketplace backend. It turns carts
//! into priced orders, reconciles each order's payment outcome across the provider's verify and webhook paths,
//! applies the financial side effects of a completed payment exactly once, and lets sellers withdraw what they have
//! earned without ever authorizing more than is available.
//!
//! The library is divided into these sections:
//! 1. Storage backends ([`mod@traits`] and [`mod@sqlite`]). The traits define the contract a backend must fulfil;
//!    SQLite is the supported implementation. You should never need to access the database directly. The exception
//!    is the data types, which are defined in [`mod@db_types`] and are public.
//! 2. The public API objects: [`CheckoutApi`], [`ReconciliationApi`], [`LedgerApi`] and [`PayoutApi`]. Each takes its
//!    backend (and gateway adapter) explicitly, so each can be tested against fakes.
//! 3. Payment provider adapters are *not* part of this crate. The engine only knows the [`PaymentGateway`] and
//!    [`PayoutGateway`] traits.
//!
//! The engine also emits events when orders and payouts settle. See [`mod@events`].
pub mod db_types;
mod engine_api;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use engine_api::{
    checkout_api::CheckoutApi,
    ledger_api::LedgerApi,
    order_objects,
    outcomes,
    payout_api::PayoutApi,
    payout_objects,
    reconciliation_api::ReconciliationApi,
    settings::{EngineSettings, DEFAULT_GATEWAY_TIMEOUT, DEFAULT_MINIMUM_WITHDRAWAL},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CheckoutError,
    CheckoutManagement,
    GatewayError,
    LedgerError,
    PaymentGateway,
    PayoutError,
    PayoutGateway,
    PayoutManagement,
    ReconciliationError,
    RevenueLedger,
    SettlementManagement,
};
