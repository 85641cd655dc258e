//! Auth failure broadcast.
//!
//! A plain observer list: `emit` calls every current subscriber once and
//! forgets the event. Nothing is queued, and late subscribers see nothing
//! from before they subscribed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::{Deserialize, Serialize};

use crate::errors::AuthFailureReason;

/// A request the backend rejected with 401 or 403.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFailureEvent {
    pub reason: AuthFailureReason,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
}

impl AuthFailureEvent {
    /// Build the event for a 401/403 status; `None` for any other status.
    pub fn from_status(status: u16, source: Option<&str>) -> Option<Self> {
        AuthFailureReason::from_status(status).map(|reason| Self {
            reason,
            status,
            source: source.map(str::to_string),
        })
    }
}

type Handler = Arc<dyn Fn(&AuthFailureEvent) + Send + Sync>;
type HandlerList = Mutex<Vec<(u64, Handler)>>;

/// Broadcasts [`AuthFailureEvent`]s to whoever is listening.
#[derive(Default)]
pub struct AuthFailureSignal {
    handlers: Arc<HandlerList>,
    next_id: AtomicU64,
}

impl AuthFailureSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. It stays registered until
    /// [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&AuthFailureEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.handlers).push((id, Arc::new(handler)));
        Subscription {
            id,
            handlers: Arc::downgrade(&self.handlers),
        }
    }

    /// Deliver `event` to every current subscriber. Dropped silently when
    /// there are none.
    pub fn emit(&self, event: &AuthFailureEvent) {
        // Handlers run without the lock held so they may (un)subscribe.
        let handlers: Vec<Handler> = lock(&self.handlers)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        if handlers.is_empty() {
            tracing::debug!(status = event.status, "Auth failure signal has no subscribers");
            return;
        }
        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.handlers).len()
    }
}

impl std::fmt::Debug for AuthFailureSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFailureSignal")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle returned by [`AuthFailureSignal::subscribe`].
#[must_use = "dropping the subscription keeps the handler registered; call unsubscribe to remove it"]
pub struct Subscription {
    id: u64,
    handlers: Weak<HandlerList>,
}

impl Subscription {
    /// Remove the handler. A no-op once the signal itself is gone.
    pub fn unsubscribe(self) {
        if let Some(handlers) = self.handlers.upgrade() {
            lock(&handlers).retain(|(id, _)| *id != self.id);
        }
    }
}

fn lock(handlers: &HandlerList) -> std::sync::MutexGuard<'_, Vec<(u64, Handler)>> {
    handlers.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unauthorized() -> AuthFailureEvent {
        AuthFailureEvent::from_status(401, Some("/products")).unwrap()
    }

    fn recorder() -> (Arc<Mutex<Vec<AuthFailureEvent>>>, impl Fn(&AuthFailureEvent) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |event: &AuthFailureEvent| sink.lock().unwrap().push(event.clone()))
    }

    #[test]
    fn test_event_from_status() {
        let event = unauthorized();
        assert_eq!(event.reason, AuthFailureReason::Unauthorized);
        assert_eq!(event.source.as_deref(), Some("/products"));
        assert_eq!(
            AuthFailureEvent::from_status(403, None).unwrap().reason,
            AuthFailureReason::Forbidden
        );
        assert!(AuthFailureEvent::from_status(500, None).is_none());
    }

    #[test]
    fn test_emit_without_subscribers_is_dropped() {
        let signal = AuthFailureSignal::new();
        signal.emit(&unauthorized());

        let (seen, handler) = recorder();
        let _subscription = signal.subscribe(handler);
        assert!(seen.lock().unwrap().is_empty(), "no replay for late subscribers");
    }

    #[test]
    fn test_every_subscriber_gets_each_event_once() {
        let signal = AuthFailureSignal::new();
        let (first, handler) = recorder();
        let _a = signal.subscribe(handler);
        let (second, handler) = recorder();
        let _b = signal.subscribe(handler);

        signal.emit(&unauthorized());

        assert_eq!(*first.lock().unwrap(), vec![unauthorized()]);
        assert_eq!(*second.lock().unwrap(), vec![unauthorized()]);
    }

    #[test]
    fn test_unsubscribe() {
        let signal = AuthFailureSignal::new();
        let (seen, handler) = recorder();
        let subscription = signal.subscribe(handler);
        assert_eq!(signal.subscriber_count(), 1);

        subscription.unsubscribe();
        assert_eq!(signal.subscriber_count(), 0);

        signal.emit(&unauthorized());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_handler_may_subscribe_during_emit() {
        let signal = Arc::new(AuthFailureSignal::new());
        let inner = Arc::clone(&signal);
        let _subscription = signal.subscribe(move |_| {
            let _nested = inner.subscribe(|_| {});
        });

        signal.emit(&unauthorized());
        assert_eq!(signal.subscriber_count(), 2);
    }
}
