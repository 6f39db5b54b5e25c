//! Type-erased publish/subscribe event bus.
//!
//! Subsystems talk through events without depending on each other's types.
//! Any `'static` type is an event; nothing has to implement a base trait.
//!
//! # Example
//!
//! ```ignore
//! let bus = EventBus::new();
//!
//! let id = bus.subscribe(|event: &Clicked| {
//!     tracing::info!(entity = %event.entity, "clicked");
//! });
//!
//! bus.raise(&Clicked { entity });
//! bus.unsubscribe::<Clicked>(id);
//! ```
//!
//! Subscription ids are handles into the bus's own callback registry, so a
//! removed subscription can never be confused with a newer one. They also
//! carry the issuing bus's tag, and other buses ignore them.

mod bus;
mod event;
mod logger;
mod subscriber;

pub use bus::EventBus;
pub use event::{Envelope, Event, EventTypeId};
pub use logger::{EventLogger, LogOutput};
pub use subscriber::{Subscriber, SubscriptionId};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Event, EventBus, EventLogger, LogOutput, SubscriptionId};
}
