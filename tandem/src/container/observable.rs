use super::{Container, ContainerId, ValueContainer};
use crate::common::{
    atomic, Atomic, EventBus, EventCallback, EventListener, ReadExecutor, SubscriberRef,
    WriteExecutor,
};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Change notification delivered by [`ObservableStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoreEvent<V> {
    /// The value after the change
    pub current: V,
    /// The value before the change
    pub previous: V,
}

/// A self-contained observable value container.
///
/// Holds one value, notifies listeners synchronously after every write, and
/// hands out [`Container`] handles that all share the store's identity.
///
/// # Examples
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use tandem::container::{ObservableStore, StoreEvent};
///
/// let store = ObservableStore::new(10);
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counter = calls.clone();
/// store.subscribe(move |event: &StoreEvent<i32>| {
///     assert_eq!(event.current, event.previous + 5);
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// store.update(|previous| previous + 5);
/// assert_eq!(store.get(), 15);
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
pub struct ObservableStore<V> {
    inner: Arc<ObservableStoreInner<V>>,
}

impl<V> Clone for ObservableStore<V> {
    fn clone(&self) -> Self {
        ObservableStore {
            inner: self.inner.clone(),
        }
    }
}

impl<V> ObservableStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(initial: V) -> Self {
        ObservableStore {
            inner: Arc::new(ObservableStoreInner {
                id: ContainerId::new(),
                value: atomic(initial),
                listeners: EventBus::new(),
            }),
        }
    }

    pub fn id(&self) -> ContainerId {
        self.inner.id
    }

    pub fn get(&self) -> V {
        self.inner.value.read_with(|value| value.clone())
    }

    /// Replaces the value and notifies listeners.
    pub fn set(&self, value: V) {
        let previous = self
            .inner
            .value
            .write_with(|current| std::mem::replace(current, value));

        // the lock is released here, listeners may read the store again
        if self.inner.listeners.has_listeners() {
            let event = StoreEvent {
                current: self.get(),
                previous,
            };
            self.inner.listeners.publish(&event);
        }
    }

    /// Computes the next value from the current one and stores it.
    pub fn update(&self, f: impl FnOnce(&V) -> V) {
        let next = self.inner.value.read_with(f);
        self.set(next);
    }

    pub fn subscribe(
        &self,
        listener: impl EventCallback<StoreEvent<V>> + 'static,
    ) -> SubscriberRef {
        self.inner.listeners.register(EventListener::new(listener))
    }

    pub fn unsubscribe(&self, subscriber: &SubscriberRef) -> bool {
        self.inner.listeners.deregister(subscriber)
    }

    /// Returns a handle for use in transactions; every call yields the same identity.
    pub fn container(&self) -> Container<V> {
        Container::with_id(self.inner.id, Arc::new(self.clone()))
    }
}

impl<V> ValueContainer<V> for ObservableStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self) -> V {
        ObservableStore::get(self)
    }

    fn set(&self, value: V) {
        ObservableStore::set(self, value)
    }
}

impl<V> Debug for ObservableStore<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableStore")
            .field("id", &self.inner.id)
            .field("listeners", &self.inner.listeners.listener_count())
            .finish()
    }
}

struct ObservableStoreInner<V> {
    id: ContainerId,
    value: Atomic<V>,
    listeners: EventBus<StoreEvent<V>>,
}
