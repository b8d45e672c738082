//! Outward notifications.
//!
//! The turn engine reports state changes through `TurnObserver` hooks.
//! The session queues them and hands them, in the order they were raised,
//! to subscribers registered on its `EventHub`, either callbacks or tokio
//! channels.
//!
//! ## Example
//!
//! ```
//! use memory_match::events::{EventHub, SessionEvent};
//! use memory_match::core::PlayerId;
//!
//! let mut hub = EventHub::new();
//! let (id, mut rx) = hub.subscribe_channel();
//!
//! hub.dispatch(&[SessionEvent::TurnChanged(PlayerId::TWO)]);
//! assert_eq!(rx.try_recv().unwrap(), SessionEvent::TurnChanged(PlayerId::TWO));
//!
//! assert!(hub.unsubscribe(id));
//! ```

mod event;
mod hub;

pub use event::{IgnoreEvents, SessionEvent, TurnObserver};
pub use hub::{dispatch_to, EventHub, Listener, Subscriber, SubscriptionId};
