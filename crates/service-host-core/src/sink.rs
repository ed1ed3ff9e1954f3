//! Process-wide log event fan-out.
//!
//! This module provides the sink every component logs through. Producers on
//! any thread publish [`LogEvent`]s; the sink delivers each event
//! synchronously to every active subscriber, in subscription order.
//!
//! # Architecture
//!
//! ```text
//! Producers (many)         LogSink          Subscribers (0..n)
//!     │                       │                    │
//!     ├─ publish(event) ─────>│ ──> snapshot ────> on_event(&event)
//!     ├─ publish(event) ─────>│     of list  ────> on_event(&event)
//!     └─ publish(event) ─────>│                    │
//! ```
//!
//! # Delivery contract
//!
//! - Each publish call is delivered to all subscribers active at the time
//!   delivery begins, in subscription order.
//! - A subscriber that panics does not prevent delivery to the subscribers
//!   after it; the panic is contained per observer.
//! - No buffering, no retry. A subscriber added concurrently with a publish
//!   may or may not see that event.
//!
//! The sink is constructed once at process start and passed explicitly to
//! whatever needs to log or subscribe. There is no ambient global instance;
//! each test injects a fresh sink.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::event::LogEvent;

/// Receives log events from the sink.
///
/// Implementations must tolerate concurrent invocation from arbitrary
/// threads and must not mutate the event they are handed.
pub trait LogObserver: Send + Sync {
    /// Called once per published event, on the publisher's thread.
    fn on_event(&self, event: &LogEvent);
}

/// Adapter so plain closures can subscribe.
struct FnObserver<F>(F);

impl<F> LogObserver for FnObserver<F>
where
    F: Fn(&LogEvent) + Send + Sync,
{
    fn on_event(&self, event: &LogEvent) {
        (self.0)(event);
    }
}

struct SubscriberEntry {
    id: u64,
    observer: Arc<dyn LogObserver>,
}

struct SinkShared {
    subscribers: RwLock<Vec<SubscriberEntry>>,
    next_id: AtomicU64,
}

impl SinkShared {
    /// Read the subscriber list, recovering the guard if a panicking
    /// subscriber poisoned the lock.
    fn read(&self) -> RwLockReadGuard<'_, Vec<SubscriberEntry>> {
        match self.subscribers.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<SubscriberEntry>> {
        match self.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Fan-out point for structured log events.
///
/// Cheap to clone; clones share the same subscriber list.
#[derive(Clone)]
pub struct LogSink {
    shared: Arc<SinkShared>,
}

impl LogSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SinkShared {
                subscribers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Registers an observer.
    ///
    /// The returned [`Subscription`] removes the observer when dropped.
    pub fn subscribe(&self, observer: Arc<dyn LogObserver>) -> Subscription {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .write()
            .push(SubscriberEntry { id, observer });
        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Registers a closure as an observer.
    pub fn subscribe_fn<F>(&self, f: F) -> Subscription
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnObserver(f)))
    }

    /// Delivers `event` synchronously to every currently-active subscriber,
    /// in subscription order.
    ///
    /// Iterates a snapshot of the subscriber list so no lock is held while
    /// observers run, and contains each observer's panic so one failing
    /// subscriber cannot starve the rest.
    pub fn publish(&self, event: &LogEvent) {
        let snapshot: Vec<Arc<dyn LogObserver>> = self
            .shared
            .read()
            .iter()
            .map(|entry| Arc::clone(&entry.observer))
            .collect();

        for observer in snapshot {
            let _ = catch_unwind(AssertUnwindSafe(|| observer.on_event(event)));
        }
    }

    /// Number of currently-active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.read().len()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle tying one observer to the sink.
///
/// Dropping the subscription removes the observer; events published strictly
/// after the drop completes are not delivered to it. A subscription that
/// outlives its sink is a no-op on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    shared: Weak<SinkShared>,
}

impl Subscription {
    /// Removes the observer now instead of at end of scope.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.write().retain(|entry| entry.id != self.id);
        }
    }
}
