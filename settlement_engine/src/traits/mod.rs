//! #  Backend interface contracts
//!
//! This module defines the interfaces that settlement engine database *backends* and payment provider adapters must
//! implement. The public API objects in [`crate::engine_api`] are generic over these traits, so any of them can be
//! swapped for a fake in tests.
//!
//! * [`CheckoutManagement`] reads carts and live product data, and persists newly priced orders.
//! * [`SettlementManagement`] applies payment outcomes to orders through a guarded, exactly-once transition.
//! * [`RevenueLedger`] answers "how much has this seller ever earned". It has no public credit operation; credits
//!   only happen inside the settlement transition.
//! * [`PayoutManagement`] reserves, tracks and settles seller payouts.
//! * [`PaymentGateway`] and [`PayoutGateway`] are the only contact points with the external payment provider.
mod checkout_management;
mod data_objects;
mod payment_gateway;
mod payout_management;
mod revenue_ledger;
mod settlement_management;

pub use checkout_management::{CheckoutError, CheckoutManagement};
pub use data_objects::{
    CheckoutLine,
    FailureReason,
    PayoutSettlement,
    PayoutSettlementOutcome,
    SellerBalance,
    Settlement,
    SettlementOutcome,
};
pub use payment_gateway::{
    ChargeRequest,
    ChargeSession,
    GatewayError,
    PaymentGateway,
    PaymentOutcome,
    PayoutGateway,
    PayoutOutcome,
    PayoutSubmission,
    WebhookEvent,
};
pub use payout_management::{PayoutError, PayoutManagement};
pub use revenue_ledger::{LedgerError, RevenueLedger};
pub use settlement_management::{ReconciliationError, SettlementManagement};
