//! Subscriber registry.
//!
//! Callbacks are registered and removed explicitly. Channel subscriptions
//! are also removed once their receiver has been dropped.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::event::SessionEvent;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u32);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subscription({})", self.0)
    }
}

/// A registered callback.
pub type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Where a subscription delivers events.
#[derive(Clone)]
pub enum Subscriber {
    Callback(Listener),
    Channel(UnboundedSender<SessionEvent>),
}

impl Subscriber {
    /// Deliver one event. Returns false if the channel receiver is gone.
    pub fn deliver(&self, event: &SessionEvent) -> bool {
        match self {
            Subscriber::Callback(listener) => {
                listener(event);
                true
            }
            Subscriber::Channel(tx) => tx.send(event.clone()).is_ok(),
        }
    }

    /// False once a channel's receiver has been dropped.
    #[must_use]
    pub fn is_open(&self) -> bool {
        match self {
            Subscriber::Callback(_) => true,
            Subscriber::Channel(tx) => !tx.is_closed(),
        }
    }
}

/// Registry of subscribers, dispatched in subscription order.
#[derive(Default)]
pub struct EventHub {
    subscribers: FxHashMap<SubscriptionId, Subscriber>,
    next_id: u32,
}

impl EventHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback.
    pub fn subscribe(&mut self, listener: impl Fn(&SessionEvent) + Send + Sync + 'static) -> SubscriptionId {
        self.insert(Subscriber::Callback(Arc::new(listener)))
    }

    /// Register a channel that receives a clone of every event.
    ///
    /// A channel subscription is dropped once its receiver is gone: on the
    /// first failed delivery, or when another channel is subscribed.
    pub fn subscribe_channel(&mut self) -> (SubscriptionId, UnboundedReceiver<SessionEvent>) {
        self.subscribers.retain(|_, s| s.is_open());
        let (tx, rx) = unbounded_channel();
        (self.insert(Subscriber::Channel(tx)), rx)
    }

    fn insert(&mut self, subscriber: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.insert(id, subscriber);
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Number of registered subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Subscribers in subscription order.
    ///
    /// Callers dispatch on the returned list so no hub lock is held while
    /// user code runs.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(SubscriptionId, Subscriber)> {
        let mut entries: Vec<_> = self
            .subscribers
            .iter()
            .map(|(id, s)| (*id, s.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Deliver events to every subscriber, in order, dropping closed channels.
    pub fn dispatch(&mut self, events: &[SessionEvent]) {
        for id in dispatch_to(&self.snapshot(), events) {
            self.unsubscribe(id);
        }
    }
}

/// Deliver each event to each subscriber.
///
/// Returns the subscriptions whose channel turned out to be closed; they
/// receive nothing further from this call.
pub fn dispatch_to(subscribers: &[(SubscriptionId, Subscriber)], events: &[SessionEvent]) -> Vec<SubscriptionId> {
    let mut closed = Vec::new();
    for event in events {
        for (id, subscriber) in subscribers {
            if closed.contains(id) {
                continue;
            }
            if !subscriber.deliver(event) {
                closed.push(*id);
            }
        }
    }
    closed
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("subscribers", &self.subscribers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerId;
    use crate::rules::Phase;
    use std::sync::Mutex;

    #[test]
    fn test_subscribe_and_dispatch() {
        let mut hub = EventHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        hub.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        hub.dispatch(&[SessionEvent::PhaseChanged(Phase::CheckCards)]);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![SessionEvent::PhaseChanged(Phase::CheckCards)]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let mut hub = EventHub::new();
        let count = Arc::new(Mutex::new(0));

        let c = Arc::clone(&count);
        let id = hub.subscribe(move |_| *c.lock().unwrap() += 1);

        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        assert!(hub.is_empty());

        hub.dispatch(&[SessionEvent::TurnChanged(PlayerId::TWO)]);
        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[test]
    fn test_dispatch_order() {
        let mut hub = EventHub::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in 0..5 {
            let o = Arc::clone(&order);
            hub.subscribe(move |_| o.lock().unwrap().push(tag));
        }

        hub.dispatch(&[SessionEvent::TurnChanged(PlayerId::ONE)]);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_channel() {
        let mut hub = EventHub::new();
        let (_, mut rx) = hub.subscribe_channel();

        hub.dispatch(&[
            SessionEvent::PhaseChanged(Phase::SelectCards),
            SessionEvent::TurnChanged(PlayerId::ONE),
        ]);

        assert_eq!(rx.try_recv().unwrap(), SessionEvent::PhaseChanged(Phase::SelectCards));
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::TurnChanged(PlayerId::ONE));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_ids_not_reused() {
        let mut hub = EventHub::new();
        let a = hub.subscribe(|_| {});
        hub.unsubscribe(a);
        let b = hub.subscribe(|_| {});
        assert_ne!(a, b);
    }

    #[test]
    fn test_closed_channel_removed_on_dispatch() {
        let mut hub = EventHub::new();
        let (_, rx) = hub.subscribe_channel();
        let (_, mut open) = hub.subscribe_channel();
        drop(rx);

        hub.dispatch(&[
            SessionEvent::PhaseChanged(Phase::SelectCards),
            SessionEvent::TurnChanged(PlayerId::ONE),
        ]);

        assert_eq!(hub.len(), 1);
        assert_eq!(open.try_recv().unwrap(), SessionEvent::PhaseChanged(Phase::SelectCards));
        assert_eq!(open.try_recv().unwrap(), SessionEvent::TurnChanged(PlayerId::ONE));
    }

    #[test]
    fn test_resubscribing_does_not_grow() {
        let mut hub = EventHub::new();
        hub.subscribe(|_| {});

        for _ in 0..50 {
            let (_, rx) = hub.subscribe_channel();
            drop(rx);
        }

        // The last channel is still registered until the next subscribe or dispatch.
        assert_eq!(hub.len(), 2);
        hub.dispatch(&[SessionEvent::TurnChanged(PlayerId::TWO)]);
        assert_eq!(hub.len(), 1);
    }
}
