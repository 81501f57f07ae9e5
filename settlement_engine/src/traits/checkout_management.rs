use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderItem},
    traits::{data_objects::CheckoutLine, GatewayError},
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The cart is empty")]
    EmptyCart,
    #[error("A delivery address is required")]
    MissingDeliveryAddress,
    #[error("Insufficient stock for product {0}")]
    InsufficientStock(String),
    #[error("Product {0} does not exist or is no longer for sale")]
    ProductNotFound(String),
    #[error("Quantity for product {0} must be positive")]
    InvalidQuantity(String),
    #[error("All items in an order must come from the same seller")]
    MultipleSellers,
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Order {0} cannot be paid for, since its payment has already been settled")]
    OrderNotPayable(i64),
    #[error("Could not initialize payment for order {order_id}: {reason}")]
    PaymentInitializationFailed { order_id: i64, reason: GatewayError },
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutError::DatabaseError(e.to_string())
    }
}

/// Storage behaviour the Checkout Aggregator needs.
#[allow(async_fn_in_trait)]
pub trait CheckoutManagement: Clone {
    /// Returns the shopper's cart, each line paired with the *current* state of its product.
    ///
    /// Cart lines that point at unknown products are returned with `product: None`.
    async fn fetch_cart_lines(&self, shopper_id: &str) -> Result<Vec<CheckoutLine>, CheckoutError>;

    /// Pairs each `(product_id, quantity)` request with the current state of its product.
    async fn fetch_lines_for_items(&self, items: &[(String, i64)]) -> Result<Vec<CheckoutLine>, CheckoutError>;

    /// Stores the order and its line items in a single atomic transaction. If `clear_cart_for` is given, that
    /// shopper's cart is emptied in the same transaction, after the order rows have been written.
    ///
    /// Stock is never touched here.
    async fn insert_order(&self, order: NewOrder, clear_cart_for: Option<&str>) -> Result<Order, CheckoutError>;

    /// Records the hosted payment page link for the order.
    async fn set_payment_url(&self, order_id: i64, url: &str) -> Result<Order, CheckoutError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, CheckoutError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, CheckoutError>;
}
