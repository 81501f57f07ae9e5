//! # Marketplace settlement server
//! This crate hosts the HTTP surface of the settlement engine. It is responsible for:
//! * Opening hosted payment sessions for shoppers' carts.
//! * Receiving payment outcomes, both from clients returning from the provider's payment page and from the provider's
//!   webhooks, and handing them to the reconciliation engine.
//! * Letting sellers see what they have earned and withdraw it.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /payments/verify`: Verify a transaction with the provider and settle its order.
//! * `POST /payments/webhook`: Signed charge and transfer notifications from the provider.
//! * `POST /payments/initialize` (shopper): Check out and open a payment session.
//! * `GET /orders/{order_id}` (shopper): Read one of your orders.
//! * `GET /seller/wallet/summary` (seller): Balances and recent payouts.
//! * `POST /seller/wallet/withdraw` (seller): Request a payout.
//! * `GET /seller/wallet/payouts` (seller): Full payout history.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod payout_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
