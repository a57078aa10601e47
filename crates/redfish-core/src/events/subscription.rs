//! Cancellable, filtered subscription over the event bus.

use std::sync::Weak;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::bus::Registry;
use super::types::Event;

/// Why [`EventSubscription::wait`] returned without an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    #[error("wait cancelled")]
    Cancelled,
    #[error("subscription closed")]
    Closed,
}

/// Detached handle that can close a subscription from another task.
///
/// Closing is idempotent. A `wait` in flight on the subscription returns
/// [`SubscriptionError::Closed`] once queued events are drained.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    id: u64,
    registry: Weak<Registry>,
}

impl SubscriptionHandle {
    /// Unregister the subscription. Returns `true` only for the call that
    /// actually removed it.
    pub fn close(&self) -> bool {
        let removed = self
            .registry
            .upgrade()
            .is_some_and(|registry| registry.unregister(self.id));
        if removed {
            tracing::trace!(listener_id = self.id, "event listener closed");
        }
        removed
    }
}

/// A registered listener returned by [`EventBus::listen`](super::EventBus::listen).
///
/// Dropping the subscription closes it.
pub struct EventSubscription {
    inbox: mpsc::UnboundedReceiver<Event>,
    handle: SubscriptionHandle,
}

impl EventSubscription {
    pub(crate) fn new(id: u64, inbox: mpsc::UnboundedReceiver<Event>, registry: Weak<Registry>) -> Self {
        Self {
            inbox,
            handle: SubscriptionHandle { id, registry },
        }
    }

    /// Wait for the next matching event or for `cancel` to fire.
    ///
    /// Cancellation is checked first, so a fired token wins over queued
    /// events.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> Result<Event, SubscriptionError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SubscriptionError::Cancelled),
            event = self.inbox.recv() => event.ok_or(SubscriptionError::Closed),
        }
    }

    /// Unregister from the bus. Safe to call more than once.
    pub fn close(&self) -> bool {
        self.handle.close()
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    /// Wait for exactly one matching event, then close.
    pub async fn run_once(mut self, cancel: &CancellationToken) -> Result<Event, SubscriptionError> {
        let result = self.wait(cancel).await;
        self.close();
        result
    }

    /// Feed every matching event to `on_event` until the wait fails.
    ///
    /// Returns the error that ended the loop; the subscription is closed.
    pub async fn run_forever<F>(mut self, cancel: &CancellationToken, mut on_event: F) -> SubscriptionError
    where
        F: FnMut(Event),
    {
        loop {
            match self.wait(cancel).await {
                Ok(event) => on_event(event),
                Err(err) => {
                    self.close();
                    return err;
                }
            }
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.handle.close();
    }
}

impl std::fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscription")
            .field("id", &self.handle.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_on_cancel() {
        let bus = EventBus::new();
        let mut sub = bus.listen(|_| true);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(sub.wait(&cancel).await.unwrap_err(), SubscriptionError::Cancelled);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let bus = EventBus::new();
        let sub = bus.listen(|_| true);
        assert_eq!(bus.subscriber_count(), 1);

        assert!(sub.close());
        assert!(!sub.close());
        assert!(!sub.handle().close());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_close_wakes_inflight_wait() {
        let bus = EventBus::new();
        let mut sub = bus.listen(|_| true);
        let handle = sub.handle();
        let cancel = CancellationToken::new();

        let waiter = tokio::spawn(async move { sub.wait(&cancel).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.close();

        let result = waiter.await.unwrap();
        assert_eq!(result.unwrap_err(), SubscriptionError::Closed);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_unregisters() {
        let bus = EventBus::new();
        {
            let _sub = bus.listen(|_| true);
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_run_once_closes() {
        let bus = EventBus::new();
        let sub = bus.listen(|e| e.is_token_refresh_for("/s"));
        bus.publish_token_refresh("/s");

        let cancel = CancellationToken::new();
        let event = sub.run_once(&cancel).await.unwrap();
        assert!(event.is_token_refresh_for("/s"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_run_forever_until_cancel() {
        let bus = EventBus::new();
        let sub = bus.listen(|_| true);
        bus.publish_token_refresh("/a");
        bus.publish_token_refresh("/b");

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        let mut seen = Vec::new();
        let err = sub
            .run_forever(&cancel, |event| {
                seen.push(event);
                if seen.len() == 2 {
                    stopper.cancel();
                }
            })
            .await;

        assert_eq!(err, SubscriptionError::Cancelled);
        assert_eq!(seen.len(), 2);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
