//! Event sinks and subscription guards
//!
//! Listener attach/detach in Veil is modeled as a disposable guard: every
//! `subscribe` returns a [`Subscription`] that detaches the listener when
//! dropped. Owners that attach many listeners keep the guards in a single
//! collection and tear everything down by clearing it.
//!
//! # Example
//!
//! ```rust
//! use veil_core::events::EventSink;
//!
//! let sink: EventSink<u32> = EventSink::new();
//! let sub = sink.subscribe(|value| {
//!     assert_eq!(*value, 7);
//! });
//! sink.emit(&7);
//! drop(sub); // listener detached
//! sink.emit(&8); // no listeners
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use smallvec::SmallVec;

/// A listener registered on an [`EventSink`]
pub type ListenerFn<A> = Arc<dyn Fn(&A) + Send + Sync>;

struct SinkInner<A> {
    listeners: SmallVec<[(u64, ListenerFn<A>); 2]>,
    next_id: u64,
}

/// Ordered listener table for one event
///
/// Listeners are invoked in subscription order. The sink is cheap to clone;
/// clones share the same listener table.
pub struct EventSink<A> {
    inner: Arc<Mutex<SinkInner<A>>>,
}

impl<A> Clone for EventSink<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> Default for EventSink<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> EventSink<A> {
    /// Create an empty sink
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SinkInner {
                listeners: SmallVec::new(),
                next_id: 1,
            })),
        }
    }

    /// Attach a listener; dropping the returned guard detaches it
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&A) + Send + Sync + 'static,
        A: 'static,
    {
        let id = {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, Arc::new(listener)));
            id
        };

        let weak: Weak<Mutex<SinkInner<A>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().unwrap().listeners.retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Invoke every listener, in subscription order
    ///
    /// The listener table is snapshotted first, so a listener may subscribe
    /// or detach without poisoning the dispatch in progress.
    pub fn emit(&self, args: &A) {
        let snapshot: SmallVec<[ListenerFn<A>; 2]> = {
            let inner = self.inner.lock().unwrap();
            inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in snapshot {
            listener(args);
        }
    }

    /// Number of attached listeners
    pub fn listener_count(&self) -> usize {
        self.inner.lock().unwrap().listeners.len()
    }

    /// Detach every listener
    pub fn clear(&self) {
        self.inner.lock().unwrap().listeners.clear();
    }
}

/// Guard representing one attached listener
///
/// Dropping the guard detaches the listener. Collaborator traits also hand
/// these out for host-side attachments (bounds changes, popup closed
/// notifications), so one owner can tear down every attachment it made by
/// dropping its guards.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a detach action into a guard
    pub fn new<F>(detach: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A guard that detaches nothing
    ///
    /// For hosts that have no attachment to undo for a given capability.
    pub fn noop() -> Self {
        Self { detach: None }
    }

    /// Detach now instead of at drop time
    pub fn release(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// Shared cancel flag carried by cancelable event args
///
/// Listeners set it to veto the transition the event announces; the emitter
/// inspects it once every listener (and any taken deferral) has finished.
/// Clones share the flag, so a listener that took a deferral can keep a
/// clone and decide after the dispatch has returned.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag {
    canceled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create a flag in the not-canceled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the announced transition
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Overwrite the cancellation request
    pub fn set_canceled(&self, canceled: bool) {
        self.canceled.store(canceled, Ordering::SeqCst);
    }

    /// Whether any listener requested cancellation
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}
