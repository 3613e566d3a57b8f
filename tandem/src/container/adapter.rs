use super::ValueContainer;

/// Adapts a getter/setter pair over a foreign store into a [`ValueContainer`].
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use tandem::container::{Container, FnContainer};
///
/// let backing = Arc::new(Mutex::new(10));
/// let (read, write) = (backing.clone(), backing.clone());
/// let container = Container::new(FnContainer::new(
///     move || *read.lock().unwrap(),
///     move |value: i32| *write.lock().unwrap() = value,
/// ));
///
/// container.set(11);
/// assert_eq!(*backing.lock().unwrap(), 11);
/// ```
pub struct FnContainer<G, S> {
    getter: G,
    setter: S,
}

impl<G, S> FnContainer<G, S> {
    pub fn new(getter: G, setter: S) -> Self {
        FnContainer { getter, setter }
    }
}

impl<V, G, S> ValueContainer<V> for FnContainer<G, S>
where
    G: Fn() -> V + Send + Sync,
    S: Fn(V) + Send + Sync,
{
    fn get(&self) -> V {
        (self.getter)()
    }

    fn set(&self, value: V) {
        (self.setter)(value)
    }
}
