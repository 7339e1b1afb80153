//! Fan-out of state-change events to template trackers and loggers.

use tokio::sync::broadcast;

use stateswitch_domain::event::Event;

/// Events buffered per subscriber before it starts lagging.
pub const DEFAULT_CAPACITY: usize = 256;

/// Broadcast bus living inside the process.
///
/// Slow subscribers lose the oldest events and get a `Lagged` error on their
/// next receive; publishers never wait.
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Hand `event` to every subscriber, returning how many there were.
    pub fn publish(&self, event: Event) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for InProcessEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
