use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for closure-based event handlers.
///
/// Any `Fn(&E)` that is `Send + Sync` implements it.
pub trait EventCallback<E>: Send + Sync + Fn(&E) {}

impl<E, F> EventCallback<E> for F where F: Send + Sync + Fn(&E) {}

/// A registered handler for events of type `E`.
///
/// Cloning is cheap; clones share the wrapped callback.
pub struct EventListener<E> {
    on_event: Arc<dyn EventCallback<E>>,
}

impl<E> EventListener<E> {
    pub fn new(on_event: impl EventCallback<E> + 'static) -> Self {
        EventListener {
            on_event: Arc::new(on_event),
        }
    }

    #[inline]
    pub fn handle(&self, event: &E) {
        (self.on_event)(event)
    }
}

impl<E> Clone for EventListener<E> {
    fn clone(&self) -> Self {
        EventListener {
            on_event: self.on_event.clone(),
        }
    }
}

impl<E> Debug for EventListener<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListener").finish()
    }
}

/// Handle returned by [`EventBus::register`], used to deregister later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberRef {
    pub(crate) id: u64,
}

impl SubscriberRef {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Publishes events to registered listeners.
///
/// Delivery is synchronous and follows registration order. A listener is
/// identified only by the [`SubscriberRef`] it was registered under, so the
/// same closure registered twice is delivered twice.
///
/// The registry lock is released before listeners run, so a listener may
/// register or deregister listeners on the same bus. Changes made during a
/// publish take effect from the next publish.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use tandem::common::{EventBus, EventListener};
///
/// let bus: EventBus<u32> = EventBus::new();
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = seen.clone();
/// let subscriber = bus.register(EventListener::new(move |value: &u32| {
///     counter.fetch_add(*value as usize, Ordering::SeqCst);
/// }));
///
/// bus.publish(&5);
/// assert!(bus.deregister(&subscriber));
/// bus.publish(&5);
/// assert_eq!(seen.load(Ordering::SeqCst), 5);
/// ```
pub struct EventBus<E> {
    inner: Arc<EventBusInner<E>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        EventBus {
            inner: self.inner.clone(),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    /// Creates a new event bus instance.
    pub fn new() -> Self {
        EventBus {
            inner: Arc::new(EventBusInner::new()),
        }
    }

    /// Registers an event listener with the bus.
    pub fn register(&self, listener: EventListener<E>) -> SubscriberRef {
        self.inner.register(listener)
    }

    /// Deregisters a listener. Returns `false` if it was not registered.
    pub fn deregister(&self, subscriber: &SubscriberRef) -> bool {
        self.inner.deregister(subscriber)
    }

    /// Publishes an event to all registered listeners.
    pub fn publish(&self, event: &E) {
        self.inner.publish(event)
    }

    /// Clears all registered listeners.
    pub fn close(&self) {
        self.inner.listeners.lock().clear();
    }

    /// Returns true if there are any registered listeners.
    pub fn has_listeners(&self) -> bool {
        !self.inner.listeners.lock().is_empty()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

impl<E> Debug for EventBus<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

struct EventBusInner<E> {
    next_id: AtomicU64,
    listeners: Mutex<IndexMap<u64, EventListener<E>>>,
}

impl<E> EventBusInner<E> {
    fn new() -> Self {
        EventBusInner {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(IndexMap::new()),
        }
    }

    fn register(&self, listener: EventListener<E>) -> SubscriberRef {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().insert(id, listener);
        SubscriberRef { id }
    }

    fn deregister(&self, subscriber: &SubscriberRef) -> bool {
        // shift_remove keeps the remaining listeners in registration order
        self.listeners.lock().shift_remove(&subscriber.id).is_some()
    }

    fn publish(&self, event: &E) {
        let listeners: Vec<EventListener<E>> = {
            let guard = self.listeners.lock();
            if guard.is_empty() {
                return;
            }
            guard.values().cloned().collect()
        };

        for listener in listeners {
            listener.handle(event);
        }
    }
}
