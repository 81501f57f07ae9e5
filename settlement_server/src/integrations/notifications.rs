//! Settlement event hooks.
//!
//! Shopper and seller notifications are sent by a separate service. This module is where settled orders and payouts
//! leave the settlement core: for now every applied transition is written to the `mkt::notifications` log target,
//! which the notification service tails.
use futures::{future::BoxFuture, FutureExt};
use log::*;
use settlement_engine::{
    db_types::{PaymentStatusType, PayoutStatusType},
    events::{EventHandlers, EventHooks, OrderSettledEvent, PayoutSettledEvent},
};

pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 25;
const TARGET: &str = "mkt::notifications";

pub fn notify_order_settled(event: OrderSettledEvent) -> BoxFuture<'static, ()> {
    async move {
        let order = event.order;
        match order.payment_status {
            PaymentStatusType::Completed => info!(
                target: TARGET,
                "📬️ order_paid order={} shopper={} seller={} total={} {}",
                order.order_number, order.shopper_id, order.seller_id, order.total, order.currency
            ),
            _ => info!(
                target: TARGET,
                "📬️ order_failed order={} shopper={} reason={}",
                order.order_number,
                order.shopper_id,
                order.failure_reason.as_deref().unwrap_or("unknown")
            ),
        }
    }
    .boxed()
}

pub fn notify_payout_settled(event: PayoutSettledEvent) -> BoxFuture<'static, ()> {
    async move {
        let payout = event.payout;
        match payout.status {
            PayoutStatusType::Completed => info!(
                target: TARGET,
                "📬️ payout_completed payout={} seller={} amount={} {}",
                payout.reference, payout.seller_id, payout.amount, payout.currency
            ),
            _ => info!(
                target: TARGET,
                "📬️ payout_failed payout={} seller={} reason={}",
                payout.reference,
                payout.seller_id,
                payout.failure_reason.as_deref().unwrap_or("unknown")
            ),
        }
    }
    .boxed()
}

/// Builds the event handlers the engine APIs publish to. Call `start_handlers` on the result once the runtime is up.
pub fn create_notification_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_settled(notify_order_settled).on_payout_settled(notify_payout_settled);
    EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, hooks)
}
