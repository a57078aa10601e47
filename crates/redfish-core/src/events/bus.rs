//! Event bus for the resource event stream.
//!
//! The `EventBus` is the publish side every producer uses. Consumers register
//! a filter with [`EventBus::listen`]; the filter is evaluated at publish time
//! and matching events are queued in the listener's own inbox, so nothing
//! published after `listen` returns can be missed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use super::subscription::EventSubscription;
use super::types::{Event, MembershipEvent, ResourceEvent, TokenRefreshEvent};
use crate::resource::ResourceId;

/// Predicate deciding whether a listener receives an event.
///
/// Runs on the publisher's task for every event, so it must be cheap and
/// free of side effects.
pub type EventFilter = Box<dyn Fn(&Event) -> bool + Send + Sync>;

struct Listener {
    filter: EventFilter,
    inbox: mpsc::UnboundedSender<Event>,
}

/// Shared listener table. Subscriptions hold a weak reference to it so a
/// dropped bus does not keep them registered.
pub(crate) struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<u64, Listener>>,
}

impl Registry {
    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    fn register(&self, filter: EventFilter) -> (u64, mpsc::UnboundedReceiver<Event>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Listener { filter, inbox: tx });
        (id, rx)
    }

    /// Removes a listener. Returns `false` if it was already gone.
    pub(crate) fn unregister(&self, id: u64) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    fn dispatch(&self, event: &Event) -> usize {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut delivered = 0;
        listeners.retain(|_, listener| {
            if !(listener.filter)(event) {
                return true;
            }
            match listener.inbox.send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                // Receiver dropped without closing; forget it.
                Err(_) => false,
            }
        });
        delivered
    }

    fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Publish/subscribe hub for [`Event`]s.
///
/// Cheap to clone; all clones share one listener table.
///
/// # Example
///
/// ```
/// use redfish_core::events::{Event, EventBus, TokenRefreshEvent};
///
/// let bus = EventBus::new();
/// let sub = bus.listen(|e: &Event| e.is_token_refresh_for("/s/1"));
///
/// assert_eq!(bus.publish(TokenRefreshEvent::new("/s/1").into()), 1);
/// assert_eq!(bus.publish(TokenRefreshEvent::new("/s/2").into()), 0);
/// drop(sub);
/// assert_eq!(bus.subscriber_count(), 0);
/// ```
#[derive(Clone)]
pub struct EventBus {
    registry: Arc<Registry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new()),
        }
    }

    /// Create a new bus wrapped in an Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a filtered subscription.
    ///
    /// The filter is active as soon as this returns.
    pub fn listen<F>(&self, filter: F) -> EventSubscription
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        let (id, inbox) = self.registry.register(Box::new(filter));
        tracing::trace!(listener_id = id, "event listener registered");
        EventSubscription::new(id, inbox, Arc::downgrade(&self.registry))
    }

    /// Publish an event to every listener whose filter accepts it.
    ///
    /// Returns the number of listeners the event was queued for.
    pub fn publish(&self, event: Event) -> usize {
        self.registry.dispatch(&event)
    }

    /// Publish a "resource created" event.
    pub fn publish_created(&self, id: ResourceId, uri: impl Into<String>) -> usize {
        self.publish(ResourceEvent::created(id, uri).into())
    }

    /// Publish a "resource removed" event.
    pub fn publish_removed(&self, id: ResourceId, uri: impl Into<String>) -> usize {
        self.publish(ResourceEvent::removed(id, uri).into())
    }

    pub fn publish_member_added(
        &self,
        collection_uri: impl Into<String>,
        member_uri: impl Into<String>,
    ) -> usize {
        self.publish(MembershipEvent::added(collection_uri, member_uri).into())
    }

    pub fn publish_member_removed(
        &self,
        collection_uri: impl Into<String>,
        member_uri: impl Into<String>,
    ) -> usize {
        self.publish(MembershipEvent::removed(collection_uri, member_uri).into())
    }

    /// Publish the refresh signal for a session.
    pub fn publish_token_refresh(&self, session_uri: impl Into<String>) -> usize {
        self.publish(TokenRefreshEvent::new(session_uri).into())
    }

    /// Get the number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    #[test]
    fn test_bus_creation() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_publish_without_listeners() {
        let bus = EventBus::new();
        assert_eq!(bus.publish_created(Uuid::new_v4(), "/a"), 0);
    }

    #[tokio::test]
    async fn test_filter_active_before_first_wait() {
        let bus = EventBus::new();
        let mut sub = bus.listen(|e| e.is_token_refresh_for("/s/1"));

        // Published before anyone waits; must still be observed.
        bus.publish_token_refresh("/s/1");

        let cancel = CancellationToken::new();
        let event = sub.wait(&cancel).await.unwrap();
        assert!(event.is_token_refresh_for("/s/1"));
    }

    #[tokio::test]
    async fn test_filter_excludes_other_events() {
        let bus = EventBus::new();
        let mut sub = bus.listen(|e| e.is_removal_of("/a"));

        assert_eq!(bus.publish_token_refresh("/a"), 0);
        assert_eq!(bus.publish_removed(Uuid::new_v4(), "/b"), 0);
        assert_eq!(bus.publish_removed(Uuid::new_v4(), "/a"), 1);

        let cancel = CancellationToken::new();
        let event = sub.wait(&cancel).await.unwrap();
        assert!(event.is_removal_of("/a"));
    }

    #[tokio::test]
    async fn test_multiple_listeners() {
        let bus = EventBus::new();
        let mut sub1 = bus.listen(|_| true);
        let mut sub2 = bus.listen(|_| true);
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.publish_member_added("/c", "/c/1"), 2);

        let cancel = CancellationToken::new();
        assert!(matches!(sub1.wait(&cancel).await.unwrap(), Event::Membership(_)));
        assert!(matches!(sub2.wait(&cancel).await.unwrap(), Event::Membership(_)));
    }

    #[test]
    fn test_clones_share_listeners() {
        let bus = EventBus::new();
        let other = bus.clone();
        let _sub = other.listen(|_| true);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.publish_token_refresh("/s"), 1);
    }
}
