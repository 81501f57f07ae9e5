use cucumber::{given, then, when};
use mkt_common::MinorUnits;
use settlement_engine::{
    db_types::{AccountDetails, PaymentStatusType, PayoutMethod, PayoutStatusType},
    order_objects::CheckoutRequest,
    payout_objects::WithdrawalRequest,
    test_utils::{add_to_cart, FakeGateway, PayoutBehaviour, FAKE_WEBHOOK_SECRET},
    traits::{PaymentOutcome, PayoutOutcome, WebhookEvent},
};

use crate::cucumber::MarketWorld;

fn ngn(amount: i64) -> MinorUnits {
    MinorUnits::from_major(amount)
}

#[given(expr = "seller '{word}' lists '{word}' at {int} NGN with {int} in stock")]
async fn list_product(world: &mut MarketWorld, seller: String, product: String, price: i64, stock: i64) {
    world.system().seed_product(&product, &seller, ngn(price).value(), stock).await;
}

#[when(expr = "shopper '{word}' adds {int} '{word}' to their cart")]
async fn add_item(world: &mut MarketWorld, shopper: String, quantity: i64, product: String) {
    add_to_cart(&world.system().db, &shopper, &product, quantity).await;
}

#[when(expr = "shopper '{word}' checks out their cart")]
async fn checkout_cart(world: &mut MarketWorld, shopper: String) {
    let request = CheckoutRequest::from_cart("4 Allen Avenue, Ikeja", "card");
    match world.system().checkout.checkout(&shopper, request).await {
        Ok(result) => {
            world.orders.insert(shopper, result.order);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

/// Registers the transaction with the fake provider so the verify path can find it.
fn provider_reports(world: &MarketWorld, shopper: &str, tx_id: &str, status: &str, amount: i64) -> PaymentOutcome {
    let order = world.order_for(shopper);
    let outcome = PaymentOutcome {
        reference: order.payment_reference.clone(),
        transaction_id: tx_id.to_string(),
        amount: ngn(amount),
        currency: order.currency.clone(),
        reported_status: status.to_string(),
    };
    world.system().gateway.register_transaction(tx_id, outcome.clone());
    outcome
}

#[when(expr = "the provider reports transaction [{word}] for '{word}' as '{word}' for {int} NGN")]
async fn provider_reports_transaction(world: &mut MarketWorld, tx_id: String, shopper: String, status: String, amount: i64) {
    provider_reports(world, &shopper, &tx_id, &status, amount);
}

#[when(expr = "shopper '{word}' verifies transaction [{word}]")]
async fn verify_transaction(world: &mut MarketWorld, shopper: String, tx_id: String) {
    let reference = world.order_for(&shopper).payment_reference.clone();
    let result = world.system().reconciliation.verify_payment(&tx_id, Some(&reference)).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[when(expr = "the signed webhook for transaction [{word}] arrives")]
async fn webhook_arrives(world: &mut MarketWorld, tx_id: String) {
    deliver_webhook(world, &tx_id, FAKE_WEBHOOK_SECRET).await;
}

#[when(expr = "a webhook for transaction [{word}] arrives with signature '{word}'")]
async fn forged_webhook_arrives(world: &mut MarketWorld, tx_id: String, signature: String) {
    deliver_webhook(world, &tx_id, &signature).await;
}

async fn deliver_webhook(world: &mut MarketWorld, tx_id: &str, signature: &str) {
    let sys = world.system();
    let outcome = sys.gateway.verify_registered(tx_id).expect("Transaction was never reported by the provider");
    let body = FakeGateway::webhook_body(&WebhookEvent::Charge(outcome));
    let result = match sys.reconciliation.authenticate_webhook(&body, Some(signature)) {
        Ok(WebhookEvent::Charge(outcome)) => sys.reconciliation.apply_payment_outcome(outcome).await.map(|_| ()),
        Ok(_) => Ok(()),
        Err(e) => Err(e),
    };
    world.last_error = result.err().map(|e| e.to_string());
}

#[then(expr = "the order for '{word}' has payment status {word}")]
async fn check_payment_status(world: &mut MarketWorld, shopper: String, status: String) {
    let id = world.order_for(&shopper).id;
    let order = world.system().checkout.fetch_order_for_shopper(&shopper, id).await.expect("Order not found").order;
    let expected: PaymentStatusType = status.parse().expect("Not a payment status");
    assert_eq!(order.payment_status, expected);
}

#[then(expr = "the order for '{word}' totals {int} NGN")]
async fn check_order_total(world: &mut MarketWorld, shopper: String, total: i64) {
    assert_eq!(world.order_for(&shopper).total, ngn(total));
}

#[then(expr = "the order for '{word}' failed with a reason starting {string}")]
async fn check_failure_reason(world: &mut MarketWorld, shopper: String, prefix: String) {
    let id = world.order_for(&shopper).id;
    let order = world.system().checkout.fetch_order_for_shopper(&shopper, id).await.expect("Order not found").order;
    let reason = order.failure_reason.expect("Order has no failure reason");
    assert!(reason.starts_with(&prefix), "Unexpected failure reason: {reason}");
}

#[then(expr = "'{word}' has {int} in stock")]
async fn check_stock(world: &mut MarketWorld, product: String, stock: i64) {
    assert_eq!(world.system().stock(&product).await, stock);
}

#[then(expr = "seller '{word}' has total revenue of {int} NGN")]
async fn check_revenue(world: &mut MarketWorld, seller: String, revenue: i64) {
    let accrued = world.system().ledger.accrued(&seller).await.expect("Error reading ledger");
    assert_eq!(accrued, ngn(revenue));
}

#[then(expr = "seller '{word}' has {int} ledger entries")]
async fn check_ledger_entries(world: &mut MarketWorld, seller: String, count: usize) {
    let entries = world.system().ledger.entries(&seller).await.expect("Error reading ledger");
    assert_eq!(entries.len(), count);
}

#[then(expr = "seller '{word}' has an available balance of {int} NGN")]
async fn check_available(world: &mut MarketWorld, seller: String, balance: i64) {
    let available = world.system().payouts.available_balance(&seller).await.expect("Error reading balance");
    assert_eq!(available, ngn(balance));
}

#[when(expr = "the provider is refusing transfers with {string}")]
async fn provider_refuses(world: &mut MarketWorld, reason: String) {
    world.system().gateway.set_payout_behaviour(PayoutBehaviour::Reject(reason));
}

#[when(expr = "seller '{word}' withdraws {int} NGN to their bank account")]
async fn withdraw(world: &mut MarketWorld, seller: String, amount: i64) {
    let details = AccountDetails::bank("058", "0123456789", "Cucumber Traders");
    let request = WithdrawalRequest::new(ngn(amount), PayoutMethod::BankTransfer, details);
    match world.system().payouts.request_withdrawal(&seller, request).await {
        Ok(payout) => {
            world.payouts.insert(seller, payout);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "the provider reports the payout for '{word}' as '{word}'")]
async fn payout_reported(world: &mut MarketWorld, seller: String, status: String) {
    let reference = world.payout_for(&seller).reference.clone();
    let outcome = PayoutOutcome::with_status(&reference, &status);
    let result = world.system().payouts.apply_payout_outcome(outcome).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[then(expr = "the payout for '{word}' is {word}")]
async fn check_payout_status(world: &mut MarketWorld, seller: String, status: String) {
    let history = world.system().payouts.payout_history(&seller).await.expect("Error reading payouts");
    let latest = history.first().expect("Seller has no payouts");
    let expected: PayoutStatusType = status.parse().expect("Not a payout status");
    assert_eq!(latest.status, expected);
}

#[then(expr = "the request fails with {string}")]
async fn check_error(world: &mut MarketWorld, message: String) {
    let error = world.last_error.as_deref().expect("The last request did not fail");
    assert!(error.contains(&message), "Expected an error containing '{message}', got '{error}'");
}

#[then("the request succeeds")]
async fn check_success(world: &mut MarketWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
}
