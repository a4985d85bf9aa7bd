//! Event system for in-flight state
//!
//! Services announce when a fetch or submission starts and how it ended.
//! Observers (a CLI spinner, a UI) subscribe to drive their loading and
//! submitting indicators.
//!
//! The bus uses `tokio::sync::broadcast`: emitting with no subscribers is a
//! no-op, and lagging subscribers miss the oldest events rather than
//! blocking the emitter.
//!
//! # Example
//!
//! ```no_run
//! use libcoastwatch::service::events::{EventBus, Event};
//!
//! # async fn example() {
//! let event_bus = EventBus::new(100);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus.emit(Event::FeedLoading { refresh: false });
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event receiver type alias
pub type EventReceiver = broadcast::Receiver<Event>;

/// Broadcast bus shared by all services
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus buffering `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers without blocking
    pub fn emit(&self, event: Event) {
        // send() only fails when nobody is listening
        let _ = self.sender.send(event);
    }

    /// Number of active subscribers; for diagnostics only
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Events emitted by services during operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A feed fetch started; `refresh` distinguishes a pull-to-refresh
    FeedLoading { refresh: bool },

    /// A feed fetch completed
    FeedLoaded { count: usize },

    /// A feed fetch failed; previously loaded items are kept
    FeedFailed { error: String },

    /// A report submission started
    SubmissionStarted { hazard_type: String },

    /// The backend accepted the report
    SubmissionSucceeded { message: Option<String> },

    /// The submission was rejected, locally or by the backend
    SubmissionFailed { error: String },

    /// An expired session was found and purged
    SessionExpired,

    /// The launch gate decided where to route the user
    GateResolved { authenticated: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_emission_and_subscription() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.emit(Event::SubmissionStarted {
            hazard_type: "flood".to_string(),
        });

        match receiver.recv().await.unwrap() {
            Event::SubmissionStarted { hazard_type } => assert_eq!(hazard_type, "flood"),
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();

        event_bus.emit(Event::FeedLoaded { count: 3 });

        assert_eq!(receiver1.recv().await.unwrap(), Event::FeedLoaded { count: 3 });
        assert_eq!(receiver2.recv().await.unwrap(), Event::FeedLoaded { count: 3 });
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let event_bus = EventBus::new(10);

        // Must not panic or block
        event_bus.emit(Event::SessionExpired);

        assert_eq!(event_bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::FeedFailed {
            error: "Network timeout".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("feed_failed"));
        assert!(json.contains("Network timeout"));

        let deserialized: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[tokio::test]
    async fn test_subscriber_count() {
        let event_bus = EventBus::new(10);
        assert_eq!(event_bus.subscriber_count(), 0);

        let _receiver1 = event_bus.subscribe();
        assert_eq!(event_bus.subscriber_count(), 1);

        let _receiver2 = event_bus.subscribe();
        assert_eq!(event_bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.emit(Event::FeedLoading { refresh: true });
        event_bus.emit(Event::FeedLoaded { count: 0 });
        event_bus.emit(Event::GateResolved {
            authenticated: false,
        });

        assert_eq!(
            receiver.recv().await.unwrap(),
            Event::FeedLoading { refresh: true }
        );
        assert_eq!(receiver.recv().await.unwrap(), Event::FeedLoaded { count: 0 });
        assert_eq!(
            receiver.recv().await.unwrap(),
            Event::GateResolved {
                authenticated: false
            }
        );
    }
}
