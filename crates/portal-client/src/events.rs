//! Broadcast notifications consumed by decoupled view components.

use tokio::sync::broadcast;

use crate::session::Session;

/// Notifications published by the router and the authentication negotiator.
#[derive(Debug, Clone)]
pub enum Notification {
    /// A matched route transition. `name` is the view name.
    RouteChanged { name: String },

    /// A login attempt produced a session.
    SessionEstablished { session: Session },

    /// A login attempt failed.
    SessionFailure { status: Option<u16>, reason: String },
}

/// Fire-and-forget pub/sub fan-out over a tokio broadcast channel.
///
/// Cheap to clone; all clones publish into the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Notification>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish to all current subscribers. Publishing with no subscribers
    /// is not an error.
    pub fn publish(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_silent() {
        let events = EventBus::new(4);
        events.publish(Notification::RouteChanged {
            name: "dashboard".to_string(),
        });
    }

    #[test]
    fn subscribers_see_published_notifications() {
        let events = EventBus::new(4);
        let mut rx = events.subscribe();
        events.publish(Notification::SessionFailure {
            status: Some(401),
            reason: "auth failure".to_string(),
        });

        match rx.try_recv().unwrap() {
            Notification::SessionFailure { status, reason } => {
                assert_eq!(status, Some(401));
                assert_eq!(reason, "auth failure");
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }
}
