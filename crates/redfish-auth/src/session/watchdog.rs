//! Per-session idle-timeout task.
//!
//! A watchdog waits for refresh signals for its session. Each refresh starts
//! a fresh idle window. If a window elapses without one, the watchdog removes
//! the session from its collection and from the store, then exits.
//!
//! The wait is `tokio::time::timeout_at` around the subscription wait. `Timeout`
//! polls the inner future before checking the deadline, so a refresh already
//! queued when the timer fires still wins and the session is kept. Only a
//! refresh moves the deadline.

use std::sync::Arc;
use std::time::Duration;

use redfish_core::events::ResourceEventType;
use redfish_core::{Command, CommandBus, Event, EventBus, EventSubscription, ResourceId, SubscriptionError};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a watchdog stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogExit {
    /// Idle window elapsed; removal commands were issued.
    Expired,
    /// The session resource was removed by someone else.
    Removed,
    /// The cancellation token fired (logout or shutdown).
    Cancelled,
    /// The event bus went away.
    Closed,
}

impl WatchdogExit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Removed => "removed",
            Self::Cancelled => "cancelled",
            Self::Closed => "closed",
        }
    }
}

/// What a delivered event does to the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Start a new idle window.
    Refresh,
    Stop(WatchdogExit),
    /// Keep waiting; the deadline stays where it is.
    Ignore,
}

impl Step {
    fn from_event(event: &Event) -> Self {
        match event {
            Event::TokenRefresh(_) => Self::Refresh,
            Event::Resource(e) if e.event_type == ResourceEventType::Removed => {
                Self::Stop(WatchdogExit::Removed)
            }
            Event::Resource(_) | Event::Membership(_) => Self::Ignore,
        }
    }
}

/// Idle-timeout watcher for a single session.
pub struct SessionWatchdog {
    session_id: ResourceId,
    session_uri: String,
    collection_uri: String,
    idle_timeout: Duration,
    commands: Arc<dyn CommandBus>,
    subscription: EventSubscription,
    cancel: CancellationToken,
}

impl SessionWatchdog {
    /// Creates the watchdog and registers its subscription immediately, so
    /// refreshes published before the task first runs are not lost.
    pub fn new(
        session_id: ResourceId,
        session_uri: impl Into<String>,
        collection_uri: impl Into<String>,
        idle_timeout: Duration,
        commands: Arc<dyn CommandBus>,
        events: &EventBus,
        cancel: CancellationToken,
    ) -> Self {
        let session_uri = session_uri.into();
        let uri = session_uri.clone();
        let subscription =
            events.listen(move |e| e.is_token_refresh_for(&uri) || e.is_removal_of(&uri));

        Self {
            session_id,
            session_uri,
            collection_uri: collection_uri.into(),
            idle_timeout,
            commands,
            subscription,
            cancel,
        }
    }

    pub fn session_uri(&self) -> &str {
        &self.session_uri
    }

    /// Run on the current runtime.
    pub fn spawn(self) -> JoinHandle<WatchdogExit> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) -> WatchdogExit {
        let mut deadline = Instant::now() + self.idle_timeout;
        let exit = loop {
            let waited =
                tokio::time::timeout_at(deadline, self.subscription.wait(&self.cancel)).await;

            match waited {
                Ok(Ok(event)) => match Step::from_event(&event) {
                    Step::Refresh => {
                        tracing::trace!(session_uri = %self.session_uri, "session refreshed");
                        deadline = Instant::now() + self.idle_timeout;
                    }
                    Step::Stop(exit) => break exit,
                    Step::Ignore => {
                        tracing::trace!(session_uri = %self.session_uri, "ignoring event");
                    }
                },
                Ok(Err(SubscriptionError::Cancelled)) => break WatchdogExit::Cancelled,
                Ok(Err(SubscriptionError::Closed)) => break WatchdogExit::Closed,
                Err(_elapsed) => {
                    self.subscription.close();
                    self.expire().await;
                    break WatchdogExit::Expired;
                }
            }
        };

        self.subscription.close();
        tracing::debug!(
            session_uri = %self.session_uri,
            exit = exit.as_str(),
            "session watchdog stopped"
        );
        exit
    }

    /// Best effort: failures are logged and the watchdog still terminates.
    async fn expire(&self) {
        tracing::info!(
            session_uri = %self.session_uri,
            idle_timeout = ?self.idle_timeout,
            "session idle timeout elapsed, removing session"
        );

        let unlink = Command::RemoveCollectionMember {
            collection_uri: self.collection_uri.clone(),
            member_uri: self.session_uri.clone(),
        };
        if let Err(e) = self.commands.dispatch(unlink).await {
            tracing::warn!(
                session_uri = %self.session_uri,
                error = %e,
                "failed to unlink expired session from collection"
            );
        }

        let remove = Command::RemoveResource {
            id: self.session_id,
            uri: self.session_uri.clone(),
        };
        if let Err(e) = self.commands.dispatch(remove).await {
            tracing::warn!(
                session_uri = %self.session_uri,
                error = %e,
                "failed to remove expired session"
            );
        }
    }
}

impl std::fmt::Debug for SessionWatchdog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionWatchdog")
            .field("session_uri", &self.session_uri)
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}
