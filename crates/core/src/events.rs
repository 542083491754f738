//! Event system infrastructure for the session layer.
//!
//! Provides the publish/subscribe primitive every stateful component owns by
//! composition (never mixed into the component itself):
//!
//! - [`EventBus`] - keyed dispatcher with ordered callbacks and one-shot waiters
//! - [`Subscription`] - handle for removing a registered callback
//! - [`SessionEvent`] - the host-visible recording lifecycle events
//!
//! # Design
//!
//! Handlers registered for a key fire synchronously on the emitting task, in
//! registration order. A panicking handler is isolated: the panic is caught,
//! reported via `tracing`, and the remaining handlers still run. Waiters are
//! drained before handlers so `wait_for` has guaranteed delivery.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

/// An event type dispatchable through an [`EventBus`].
///
/// Each event variant maps to a `Copy + Eq` key; handlers subscribe per key.
pub trait BusEvent: Clone + Send + 'static {
    /// Key type identifying an event variant.
    type Key: Copy + Eq + Send + std::fmt::Debug + 'static;

    /// Returns the key for this event.
    fn key(&self) -> Self::Key;
}

/// Handle for a registered callback; pass to [`EventBus::off`] to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

struct HandlerEntry<E: BusEvent> {
    id: u64,
    key: E::Key,
    callback: Arc<dyn Fn(&E) + Send + Sync>,
}

struct WaiterEntry<E: BusEvent> {
    key: E::Key,
    complete_tx: oneshot::Sender<E>,
}

/// Keyed event dispatcher with ordered callbacks and one-shot waiters.
///
/// Emitting an event with no registered handlers is a no-op, not an error.
pub struct EventBus<E: BusEvent> {
    handlers: Mutex<Vec<HandlerEntry<E>>>,
    waiters: Mutex<Vec<WaiterEntry<E>>>,
    next_id: AtomicU64,
}

impl<E: BusEvent> EventBus<E> {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
            waiters: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a handler for events with the given key.
    ///
    /// Handlers for the same key fire in registration order.
    pub fn on(
        &self,
        key: E::Key,
        handler: impl Fn(&E) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handlers.lock().push(HandlerEntry {
            id,
            key,
            callback: Arc::new(handler),
        });
        Subscription(id)
    }

    /// Removes a previously registered handler.
    ///
    /// Removal is idempotent: a second `off` with the same subscription is a
    /// no-op.
    pub fn off(&self, subscription: Subscription) {
        self.handlers.lock().retain(|entry| entry.id != subscription.0);
    }

    /// Emits an event to all matching waiters and handlers.
    ///
    /// Waiters are completed first and removed. Handlers then run in
    /// registration order; a panicking handler is caught and reported without
    /// affecting the remaining handlers or the emitter.
    pub fn emit(&self, event: E) {
        let key = event.key();

        {
            let mut waiters = self.waiters.lock();
            let mut i = 0;
            while i < waiters.len() {
                if waiters[i].key == key {
                    let entry = waiters.swap_remove(i);
                    let _ = entry.complete_tx.send(event.clone());
                } else {
                    i += 1;
                }
            }
        }

        // Snapshot outside the lock: a handler may call on()/off() reentrantly.
        let callbacks: Vec<Arc<dyn Fn(&E) + Send + Sync>> = self
            .handlers
            .lock()
            .iter()
            .filter(|entry| entry.key == key)
            .map(|entry| Arc::clone(&entry.callback))
            .collect();

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
                tracing::error!(?key, "Event handler panicked; continuing with remaining handlers");
            }
        }
    }

    /// Registers a one-shot waiter for the next event with the given key.
    pub fn wait_for(&self, key: E::Key) -> oneshot::Receiver<E> {
        let (complete_tx, complete_rx) = oneshot::channel();
        self.waiters.lock().push(WaiterEntry { key, complete_tx });
        complete_rx
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Recording lifecycle events exchanged between the host UI and the session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A recording started (no payload).
    RecordingStarted,
    /// A recording stopped; carries the results payload verbatim.
    RecordingStopped(Value),
    /// Host UI requested a recording start.
    UiStartRecording,
    /// Host UI requested a recording stop.
    UiStopRecording,
    /// The session panel finished opening.
    Ready,
    /// The session panel was destroyed.
    Destroyed,
}

/// Key identifying a [`SessionEvent`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    RecordingStarted,
    RecordingStopped,
    UiStartRecording,
    UiStopRecording,
    Ready,
    Destroyed,
}

impl BusEvent for SessionEvent {
    type Key = SessionEventKind;

    fn key(&self) -> SessionEventKind {
        match self {
            SessionEvent::RecordingStarted => SessionEventKind::RecordingStarted,
            SessionEvent::RecordingStopped(_) => SessionEventKind::RecordingStopped,
            SessionEvent::UiStartRecording => SessionEventKind::UiStartRecording,
            SessionEvent::UiStopRecording => SessionEventKind::UiStopRecording,
            SessionEvent::Ready => SessionEventKind::Ready,
            SessionEvent::Destroyed => SessionEventKind::Destroyed,
        }
    }
}
