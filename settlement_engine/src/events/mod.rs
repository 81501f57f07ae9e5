//! Settlement event hooks.
//!
//! Components outside the settlement core (notifications, analytics, search indexing) learn about settled orders and
//! payouts by subscribing here. Events are only published for transitions that were actually applied, never for
//! replays.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
