use crate::common::{Atomic, ReadExecutor, WriteExecutor};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use uuid::Uuid;

/// Read/write access to one piece of state.
///
/// Implementations use interior mutability: `set` takes `&self` so the same
/// container can be shared between the application and the history it is
/// tracked by.
pub trait ValueContainer<V>: Send + Sync {
    /// Returns the current value.
    fn get(&self) -> V;

    /// Replaces the current value.
    fn set(&self, value: V);
}

impl<V> ValueContainer<V> for Atomic<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self) -> V {
        self.read_with(|value| value.clone())
    }

    fn set(&self, value: V) {
        self.write_with(|current| *current = value);
    }
}

/// Identity token of a [`Container`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(Uuid);

impl ContainerId {
    pub(crate) fn new() -> Self {
        ContainerId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for ContainerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity-carrying handle over a [`ValueContainer`].
///
/// Every call to [`Container::new`] mints a fresh [`ContainerId`]; clones of a
/// handle share it. Equality and hashing only look at the id, so two handles
/// wrapping equal values are still different containers.
///
/// # Examples
///
/// ```rust
/// use tandem::atomic;
/// use tandem::container::Container;
///
/// let container = Container::new(atomic(1_u32));
/// let alias = container.clone();
/// alias.set(2);
///
/// assert_eq!(container.get(), 2);
/// assert_eq!(container, alias);
/// assert_ne!(container, Container::new(atomic(2_u32)));
/// ```
pub struct Container<V> {
    id: ContainerId,
    inner: Arc<dyn ValueContainer<V>>,
}

impl<V: 'static> Container<V> {
    /// Wraps `container` under a new identity.
    pub fn new(container: impl ValueContainer<V> + 'static) -> Self {
        Container {
            id: ContainerId::new(),
            inner: Arc::new(container),
        }
    }

    /// Wraps an already shared container under a new identity.
    ///
    /// Every call mints a fresh identity, even for the same `Arc`, and the
    /// store tracks history and staged edits per identity. Wrap a shared
    /// container once and clone the resulting handle.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use tandem::atomic;
    /// use tandem::container::{Container, ValueContainer};
    ///
    /// let shared: Arc<dyn ValueContainer<u32>> = Arc::new(atomic(1_u32));
    /// let first = Container::from_arc(shared.clone());
    /// let second = Container::from_arc(shared);
    ///
    /// assert_ne!(first, second);
    /// assert_eq!(first, first.clone());
    /// ```
    pub fn from_arc(container: Arc<dyn ValueContainer<V>>) -> Self {
        Container {
            id: ContainerId::new(),
            inner: container,
        }
    }
}

impl<V> Container<V> {
    pub(crate) fn with_id(id: ContainerId, container: Arc<dyn ValueContainer<V>>) -> Self {
        Container {
            id,
            inner: container,
        }
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    #[inline]
    pub fn get(&self) -> V {
        self.inner.get()
    }

    #[inline]
    pub fn set(&self, value: V) {
        self.inner.set(value)
    }
}

impl<V> Clone for Container<V> {
    fn clone(&self) -> Self {
        Container {
            id: self.id,
            inner: self.inner.clone(),
        }
    }
}

impl<V> PartialEq for Container<V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<V> Eq for Container<V> {}

impl<V> Hash for Container<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl<V> Debug for Container<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container").field("id", &self.id).finish()
    }
}
