//! Request and response bodies for the HTTP surface. All of them use camelCase field names on the wire, except
//! where the payment provider's redirect parameters dictate otherwise.
use std::fmt::Display;

use mkt_common::MinorUnits;
use serde::{Deserialize, Serialize};
use settlement_engine::{
    db_types::{AccountDetails, Order, OrderItem, OrderStatusType, PaymentStatusType, Payout, PayoutMethod, PayoutStatusType},
    order_objects::{CheckoutItem, CheckoutRequest, CheckoutResult, OrderWithItems},
    payout_objects::{WalletSummary, WithdrawalRequest},
    traits::Settlement,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//------------------------------------------   Payment initialization  -----------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializePaymentRequest {
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub payment_method: String,
    pub phone: Option<String>,
    /// Overrides the email in the caller's access token, if any.
    pub email: Option<String>,
    /// Explicit items to buy. When absent, the shopper's cart is checked out.
    pub items: Option<Vec<CheckoutItem>>,
    /// Set this to re-open the payment session of an existing, unpaid order instead of creating a new one.
    pub order_id: Option<i64>,
}

impl InitializePaymentRequest {
    pub fn into_checkout_request(self, token_email: Option<String>) -> CheckoutRequest {
        CheckoutRequest {
            items: self.items,
            delivery_address: self.delivery_address,
            payment_method: self.payment_method,
            phone: self.phone.filter(|p| !p.trim().is_empty()),
            email: self.email.or(token_email),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBrief {
    pub id: i64,
    pub total: MinorUnits,
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub payment_url: String,
    pub reference: String,
    pub amount: MinorUnits,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializePaymentResponse {
    pub order: OrderBrief,
    pub payment: PaymentSession,
}

impl From<CheckoutResult> for InitializePaymentResponse {
    fn from(result: CheckoutResult) -> Self {
        let CheckoutResult { order, session } = result;
        Self {
            order: OrderBrief { id: order.id, total: order.total, status: order.status },
            payment: PaymentSession {
                payment_url: session.payment_url,
                reference: order.payment_reference,
                amount: order.total,
                currency: order.currency,
            },
        }
    }
}

//------------------------------------------        Verification       -----------------------------------------------
/// The query parameters the provider appends to the redirect URL, forwarded by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub transaction_id: String,
    pub tx_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Success,
    Failed,
    Pending,
}

impl From<PaymentStatusType> for VerificationStatus {
    fn from(status: PaymentStatusType) -> Self {
        match status {
            PaymentStatusType::Completed => Self::Success,
            PaymentStatusType::Failed => Self::Failed,
            PaymentStatusType::Pending => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPaymentState {
    pub id: i64,
    pub order_number: String,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub status: VerificationStatus,
    pub order: OrderPaymentState,
}

impl From<&Order> for VerifyPaymentResponse {
    fn from(order: &Order) -> Self {
        Self {
            status: order.payment_status.into(),
            order: OrderPaymentState {
                id: order.id,
                order_number: order.order_number.clone(),
                status: order.status,
                payment_status: order.payment_status,
                failure_reason: order.failure_reason.clone(),
            },
        }
    }
}

impl From<Settlement> for VerifyPaymentResponse {
    fn from(settlement: Settlement) -> Self {
        Self::from(settlement.order())
    }
}

//------------------------------------------          Orders           -----------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: MinorUnits,
    pub line_total: MinorUnits,
}

impl From<OrderItem> for OrderLine {
    fn from(item: OrderItem) -> Self {
        let line_total = item.line_total();
        Self { product_id: item.product_id, quantity: item.quantity, unit_price: item.unit_price, line_total }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub id: i64,
    pub order_number: String,
    pub seller_id: String,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatusType,
    pub payment_reference: String,
    pub payment_url: Option<String>,
    pub subtotal: MinorUnits,
    pub tax: MinorUnits,
    pub shipping: MinorUnits,
    pub total: MinorUnits,
    pub currency: String,
    pub delivery_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub items: Vec<OrderLine>,
}

impl From<OrderWithItems> for OrderDetails {
    fn from(value: OrderWithItems) -> Self {
        let OrderWithItems { order, items } = value;
        Self {
            id: order.id,
            order_number: order.order_number,
            seller_id: order.seller_id,
            status: order.status,
            payment_status: order.payment_status,
            payment_reference: order.payment_reference,
            payment_url: order.payment_url,
            subtotal: order.subtotal,
            tax: order.tax,
            shipping: order.shipping,
            total: order.total,
            currency: order.currency,
            delivery_address: order.delivery_address,
            failure_reason: order.failure_reason,
            items: items.into_iter().map(OrderLine::from).collect(),
        }
    }
}

//------------------------------------------          Wallet           -----------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutView {
    pub reference: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub method: PayoutMethod,
    pub status: PayoutStatusType,
    pub account_details: AccountDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<Payout> for PayoutView {
    fn from(payout: Payout) -> Self {
        Self {
            reference: payout.reference,
            amount: payout.amount,
            currency: payout.currency,
            method: payout.method,
            status: payout.status,
            account_details: payout.account_details.0,
            narration: payout.narration,
            failure_reason: payout.failure_reason,
            created_at: payout.created_at,
            completed_at: payout.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummaryResponse {
    pub available_balance: MinorUnits,
    pub total_revenue: MinorUnits,
    pub total_sales: i64,
    pub total_paid_out: MinorUnits,
    pub pending_balance: MinorUnits,
    pub recent_payouts: Vec<PayoutView>,
}

impl From<WalletSummary> for WalletSummaryResponse {
    fn from(summary: WalletSummary) -> Self {
        Self {
            available_balance: summary.available_balance,
            total_revenue: summary.total_revenue,
            total_sales: summary.total_sales,
            total_paid_out: summary.total_paid_out,
            pending_balance: summary.pending_balance,
            recent_payouts: summary.recent_payouts.into_iter().map(PayoutView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    /// In minor units.
    pub amount: MinorUnits,
    pub method: PayoutMethod,
    pub account_details: AccountDetails,
    pub narration: Option<String>,
}

impl From<WithdrawRequest> for WithdrawalRequest {
    fn from(value: WithdrawRequest) -> Self {
        WithdrawalRequest {
            amount: value.amount,
            method: value.method,
            account_details: value.account_details,
            narration: value.narration,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawResponse {
    pub reference: String,
    pub status: PayoutStatusType,
}

impl From<&Payout> for WithdrawResponse {
    fn from(payout: &Payout) -> Self {
        Self { reference: payout.reference.clone(), status: payout.status }
    }
}
