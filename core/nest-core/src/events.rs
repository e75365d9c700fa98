//! Change notifications for completion state and session lifecycle.
//!
//! Events are fire-and-forget: publishing never fails and never blocks, even
//! with no subscribers. Payloads are hints, not state. Consumers re-query the
//! completion store or session manager after receiving one.
//!
//! Built on `tokio::sync::broadcast`, which needs no runtime for `send` and
//! `try_recv`, so synchronous clients can poll a [`Subscription`] directly.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::session::SessionStatus;

/// Buffered events per subscriber before the slowest one starts lagging.
pub const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum NestEvent {
    CompletionChanged {
        routine_id: String,
        action_index: usize,
        completed: bool,
    },
    SessionStatusChanged {
        session_id: String,
        from: SessionStatus,
        to: SessionStatus,
    },
    SessionUpdated {
        session_id: String,
    },
    SessionArchived {
        session_id: String,
    },
    SessionDeleted {
        session_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CompletionChanged,
    SessionStatusChanged,
    SessionUpdated,
    SessionArchived,
    SessionDeleted,
}

impl NestEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            NestEvent::CompletionChanged { .. } => EventKind::CompletionChanged,
            NestEvent::SessionStatusChanged { .. } => EventKind::SessionStatusChanged,
            NestEvent::SessionUpdated { .. } => EventKind::SessionUpdated,
            NestEvent::SessionArchived { .. } => EventKind::SessionArchived,
            NestEvent::SessionDeleted { .. } => EventKind::SessionDeleted,
        }
    }

    pub fn routine_id(&self) -> Option<&str> {
        match self {
            NestEvent::CompletionChanged { routine_id, .. } => Some(routine_id),
            _ => None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            NestEvent::CompletionChanged { .. } => None,
            NestEvent::SessionStatusChanged { session_id, .. }
            | NestEvent::SessionUpdated { session_id }
            | NestEvent::SessionArchived { session_id }
            | NestEvent::SessionDeleted { session_id } => Some(session_id),
        }
    }
}

/// Which events a subscription receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Kind(EventKind),
    Routine(String),
    Session(String),
}

impl EventFilter {
    pub fn matches(&self, event: &NestEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Kind(kind) => event.kind() == *kind,
            EventFilter::Routine(id) => event.routine_id() == Some(id.as_str()),
            EventFilter::Session(id) => event.session_id() == Some(id.as_str()),
        }
    }
}

/// Process-local broadcast bus. Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<NestEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: NestEvent) {
        tracing::trace!(kind = ?event.kind(), "Publishing event");
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            filter,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A filtered receiver. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<NestEvent>,
    filter: EventFilter,
}

impl Subscription {
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Returns the next matching event without blocking.
    pub fn try_next(&mut self) -> Option<NestEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Subscriber lagged; dropped events");
                    continue;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drains every matching event currently buffered.
    pub fn drain(&mut self) -> Vec<NestEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Blocks the current thread until a matching event arrives or the bus is dropped.
    ///
    /// Must not be called from within an async runtime.
    pub fn recv_blocking(&mut self) -> Option<NestEvent> {
        loop {
            match self.receiver.blocking_recv() {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Subscriber lagged; dropped events");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(routine: &str, index: usize) -> NestEvent {
        NestEvent::CompletionChanged {
            routine_id: routine.to_string(),
            action_index: index,
            completed: true,
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.publish(completion("r1", 0));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_routine_filter() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(EventFilter::Routine("r1".to_string()));
        bus.publish(completion("r2", 0));
        bus.publish(completion("r1", 3));
        bus.publish(NestEvent::SessionUpdated {
            session_id: "r1".to_string(),
        });

        assert_eq!(sub.drain(), vec![completion("r1", 3)]);
    }

    #[test]
    fn test_session_filter_matches_all_session_kinds() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(EventFilter::Session("s1".to_string()));
        bus.publish(NestEvent::SessionStatusChanged {
            session_id: "s1".to_string(),
            from: SessionStatus::Upcoming,
            to: SessionStatus::InProgress,
        });
        bus.publish(NestEvent::SessionArchived {
            session_id: "s1".to_string(),
        });
        bus.publish(NestEvent::SessionArchived {
            session_id: "s2".to_string(),
        });
        assert_eq!(sub.drain().len(), 2);
    }

    #[test]
    fn test_kind_filter() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(EventFilter::Kind(EventKind::SessionDeleted));
        bus.publish(completion("r1", 0));
        bus.publish(NestEvent::SessionDeleted {
            session_id: "s9".to_string(),
        });
        let events = sub.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].session_id(), Some("s9"));
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let bus = EventBus::new();
        let sub = bus.subscribe(EventFilter::All);
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_lagged_subscriber_keeps_newest() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(EventFilter::All);
        for i in 0..(EVENT_BUS_CAPACITY + 10) {
            bus.publish(completion("r1", i));
        }
        let events = sub.drain();
        assert_eq!(events.len(), EVENT_BUS_CAPACITY);
        assert_eq!(events.last(), Some(&completion("r1", EVENT_BUS_CAPACITY + 9)));
    }
}
