//! Terminal notification bus.
//!
//! Subscribers register for [`TerminalEvent`]s and get a bounded receiver.
//! Publishing never blocks: a subscriber whose queue is full misses the
//! event, which is fine for "something changed" notifications.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Mutex, MutexGuard, PoisonError};

const SUBSCRIBER_QUEUE: usize = 4;

/// Notifications delivered to terminal sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerminalEvent {
    /// The window was resized.
    SizeChanged,
    /// Writing to the output failed with a broken pipe.
    BrokenPipe,
}

/// Handle returned by [`EventBus::register`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: Receiver<TerminalEvent>,
}

impl Subscription {
    /// Id to pass to [`EventBus::unregister`].
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The event stream.
    #[must_use]
    pub fn receiver(&self) -> &Receiver<TerminalEvent> {
        &self.rx
    }
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    senders: HashMap<u64, SyncSender<TerminalEvent>>,
}

/// Fan-out of terminal events to registered subscribers.
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Subscribers>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a subscriber.
    pub fn register(&self) -> Subscription {
        let (tx, rx) = mpsc::sync_channel(SUBSCRIBER_QUEUE);
        let mut subs = self.lock();
        let id = subs.next_id;
        subs.next_id += 1;
        subs.senders.insert(id, tx);
        Subscription { id, rx }
    }

    /// Remove a subscriber; its receiver sees a disconnect.
    pub fn unregister(&self, id: u64) {
        self.lock().senders.remove(&id);
    }

    /// Deliver `event` to every subscriber without blocking.
    pub fn publish(&self, event: TerminalEvent) {
        let mut subs = self.lock();
        subs.senders.retain(|id, tx| match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::trace!(subscriber = id, ?event, "subscriber queue full");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().senders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.len())
            .finish()
    }
}
