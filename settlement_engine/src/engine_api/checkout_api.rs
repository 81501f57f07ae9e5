use std::fmt::Debug;

use log::*;
use mkt_common::MinorUnits;

use crate::{
    db_types::{NewOrder, NewOrderItem, Order},
    engine_api::{
        order_objects::{CheckoutItem, CheckoutRequest, CheckoutResult, OrderWithItems},
        settings::EngineSettings,
    },
    helpers::{new_order_number, new_payment_reference, with_gateway_timeout},
    traits::{ChargeRequest, CheckoutError, CheckoutLine, CheckoutManagement, PaymentGateway},
};

/// The Checkout Aggregator. Turns a cart (or an explicit item list) into a priced order and opens a hosted payment
/// session for it.
///
/// Stock is checked against live product data but never reserved here. It is only decremented when the payment
/// settles as completed, so abandoned checkouts do not leak inventory.
pub struct CheckoutApi<B, G> {
    db: B,
    gateway: G,
    settings: EngineSettings,
}

impl<B, G> Debug for CheckoutApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({})", self.settings.currency)
    }
}

impl<B: Clone, G: Clone> Clone for CheckoutApi<B, G> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), gateway: self.gateway.clone(), settings: self.settings.clone() }
    }
}

impl<B, G> CheckoutApi<B, G> {
    pub fn new(db: B, gateway: G, settings: EngineSettings) -> Self {
        Self { db, gateway, settings }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> CheckoutApi<B, G>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    /// Prices the request and stores the order in `PENDING`/`PENDING`.
    ///
    /// The whole request is rejected if any line fails validation; there are no partial orders. When the request
    /// checks out the cart, the cart is cleared in the same transaction that writes the order.
    pub async fn create_order(&self, shopper_id: &str, request: &CheckoutRequest) -> Result<Order, CheckoutError> {
        if request.delivery_address.trim().is_empty() {
            return Err(CheckoutError::MissingDeliveryAddress);
        }
        let (lines, from_cart) = match &request.items {
            Some(items) => (self.db.fetch_lines_for_items(&merge_items(items)?).await?, false),
            None => (self.db.fetch_cart_lines(shopper_id).await?, true),
        };
        let (seller_id, items) = price_lines(lines)?;
        let subtotal = items.iter().map(|i| i.unit_price * i.quantity).sum::<MinorUnits>();
        let tax = MinorUnits::default();
        let shipping = MinorUnits::default();
        let order = NewOrder {
            order_number: new_order_number(),
            payment_reference: new_payment_reference(),
            shopper_id: shopper_id.to_string(),
            seller_id,
            items,
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
            currency: self.settings.currency.clone(),
            payment_method: request.payment_method.clone(),
            delivery_address: request.delivery_address.trim().to_string(),
            phone: request.phone.clone(),
        };
        let clear_cart = if from_cart { Some(shopper_id) } else { None };
        let order = self.db.insert_order(order, clear_cart).await?;
        info!(
            "🛒️ Order {} for {} created for shopper {shopper_id} (seller {})",
            order.order_number, order.total, order.seller_id
        );
        Ok(order)
    }

    /// Opens a hosted payment session for a pending order.
    ///
    /// If the provider call fails or times out, the order is left exactly as it was (`PENDING`/`PENDING`) and the
    /// error carries its id so that the shopper can retry with [`Self::retry_payment`].
    pub async fn initialize_payment(&self, order: Order, email: Option<String>) -> Result<CheckoutResult, CheckoutError> {
        let request = ChargeRequest {
            reference: order.payment_reference.clone(),
            amount: order.total,
            currency: order.currency.clone(),
            customer_id: order.shopper_id.clone(),
            customer_email: email,
            customer_phone: order.phone.clone(),
            payment_method: order.payment_method.clone(),
            description: format!("Payment for order {}", order.order_number),
        };
        let session = with_gateway_timeout(self.settings.gateway_timeout, self.gateway.initialize(&request))
            .await
            .map_err(|reason| {
                warn!("🛒️ Could not initialize payment for order {}: {reason}", order.order_number);
                CheckoutError::PaymentInitializationFailed { order_id: order.id, reason }
            })?;
        if session.reference != order.payment_reference {
            warn!(
                "🛒️ Provider returned reference {} for order {}, expected {}",
                session.reference, order.order_number, order.payment_reference
            );
        }
        let order = self.db.set_payment_url(order.id, &session.payment_url).await?;
        debug!("🛒️ Payment session for order {} is at {}", order.order_number, session.payment_url);
        Ok(CheckoutResult { order, session })
    }

    /// Creates the order, then opens its payment session.
    pub async fn checkout(&self, shopper_id: &str, request: CheckoutRequest) -> Result<CheckoutResult, CheckoutError> {
        let order = self.create_order(shopper_id, &request).await?;
        self.initialize_payment(order, request.email).await
    }

    /// Opens a fresh payment session for one of the shopper's orders that has not been paid yet.
    pub async fn retry_payment(
        &self,
        shopper_id: &str,
        order_id: i64,
        email: Option<String>,
    ) -> Result<CheckoutResult, CheckoutError> {
        let order = self.fetch_own_order(shopper_id, order_id).await?;
        if order.payment_status.is_terminal() {
            return Err(CheckoutError::OrderNotPayable(order_id));
        }
        debug!("🛒️ Retrying payment initialization for order {}", order.order_number);
        self.initialize_payment(order, email).await
    }

    /// Fetches an order with its line items. Orders belonging to other shoppers are reported as not found.
    pub async fn fetch_order_for_shopper(&self, shopper_id: &str, order_id: i64) -> Result<OrderWithItems, CheckoutError> {
        let order = self.fetch_own_order(shopper_id, order_id).await?;
        let items = self.db.fetch_order_items(order.id).await?;
        Ok(OrderWithItems { order, items })
    }

    async fn fetch_own_order(&self, shopper_id: &str, order_id: i64) -> Result<Order, CheckoutError> {
        match self.db.fetch_order(order_id).await? {
            Some(order) if order.shopper_id == shopper_id => Ok(order),
            _ => Err(CheckoutError::OrderNotFound(order_id)),
        }
    }
}

/// Collapses repeated products into one line, keeping the order in which products first appear.
/// Every item must carry a positive quantity, so a negative entry can never cancel out a later one.
fn merge_items(items: &[CheckoutItem]) -> Result<Vec<(String, i64)>, CheckoutError> {
    let mut merged: Vec<(String, i64)> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(CheckoutError::InvalidQuantity(item.product_id.clone()));
        }
        match merged.iter_mut().find(|(id, _)| id == &item.product_id) {
            Some((_, quantity)) => {
                *quantity = quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| CheckoutError::InvalidQuantity(item.product_id.clone()))?;
            },
            None => merged.push((item.product_id.clone(), item.quantity)),
        }
    }
    Ok(merged)
}

/// Validates every line against live product data and snapshots the current price.
///
/// Returns the seller all the lines belong to, and the priced line items.
fn price_lines(lines: Vec<CheckoutLine>) -> Result<(String, Vec<NewOrderItem>), CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let mut seller_id: Option<String> = None;
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity <= 0 {
            return Err(CheckoutError::InvalidQuantity(line.product_id));
        }
        let product = match line.product {
            Some(p) if p.is_active => p,
            _ => return Err(CheckoutError::ProductNotFound(line.product_id)),
        };
        if product.stock < line.quantity {
            debug!("🛒️ Product {} has {} in stock, {} requested", product.id, product.stock, line.quantity);
            return Err(CheckoutError::InsufficientStock(product.id));
        }
        match &seller_id {
            None => seller_id = Some(product.seller_id.clone()),
            Some(s) if *s != product.seller_id => return Err(CheckoutError::MultipleSellers),
            Some(_) => {},
        }
        items.push(NewOrderItem { product_id: product.id, quantity: line.quantity, unit_price: product.price });
    }
    let seller_id = seller_id.ok_or(CheckoutError::EmptyCart)?;
    Ok((seller_id, items))
}
