use std::{future::Future, pin::Pin, sync::Arc};

use log::debug;

use crate::events::{EventHandler, EventProducer, Handler, OrderSettledEvent, PayoutSettledEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_settled_producer: Vec<EventProducer<OrderSettledEvent>>,
    pub payout_settled_producer: Vec<EventProducer<PayoutSettledEvent>>,
}

impl EventProducers {
    pub async fn publish_order_settled(&self, event: OrderSettledEvent) {
        for emitter in &self.order_settled_producer {
            debug!("📬️ Notifying order settled hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_payout_settled(&self, event: PayoutSettledEvent) {
        for emitter in &self.payout_settled_producer {
            debug!("📬️ Notifying payout settled hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_settled: Option<EventHandler<OrderSettledEvent>>,
    pub on_payout_settled: Option<EventHandler<PayoutSettledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_settled = hooks.on_order_settled.map(|f| EventHandler::new(buffer_size, f));
        let on_payout_settled = hooks.on_payout_settled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_settled, on_payout_settled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_settled {
            result.order_settled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payout_settled {
            result.payout_settled_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_settled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_payout_settled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_settled: Option<Handler<OrderSettledEvent>>,
    pub on_payout_settled: Option<Handler<PayoutSettledEvent>>,
}

impl EventHooks {
    pub fn on_order_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_settled = Some(Arc::new(f));
        self
    }

    pub fn on_payout_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PayoutSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payout_settled = Some(Arc::new(f));
        self
    }
}
