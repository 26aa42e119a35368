//! Typed event emission shared by the cache, the wallpaper store, the
//! providers and the picker coordinator.
//!
//! Every stateful component owns an [`EventBus`] and hands out
//! [`Subscription`]s. Dropping a subscription disconnects it.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct EventBus<E: Clone> {
    tx: broadcast::Sender<E>,
}

impl<E: Clone> EventBus<E> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit an event to every live subscriber. Having none is not an error.
    pub fn emit(&self, event: E) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> Subscription<E> {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct Subscription<E: Clone> {
    rx: broadcast::Receiver<E>,
}

impl<E: Clone> Subscription<E> {
    /// Next already-emitted event, without waiting.
    pub fn try_next(&mut self) -> Option<E> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Event subscriber lagged, dropped {} events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next event. Returns `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<E> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event subscriber lagged, dropped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Everything emitted so far, oldest first.
    pub fn drain(&mut self) -> Vec<E> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_without_subscribers_is_silent() {
        let bus: EventBus<u32> = EventBus::new();
        bus.emit(1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn subscribers_see_events_in_order() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        bus.emit("a");
        bus.emit("b");
        assert_eq!(sub.drain(), vec!["a", "b"]);
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn dropping_subscription_disconnects() {
        let bus: EventBus<u8> = EventBus::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn next_returns_none_after_bus_dropped() {
        let bus: EventBus<u8> = EventBus::new();
        let mut sub = bus.subscribe();
        bus.emit(7);
        drop(bus);
        assert_eq!(sub.next().await, Some(7));
        assert_eq!(sub.next().await, None);
    }
}
