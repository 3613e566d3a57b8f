use crate::container::ContainerId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::{Debug, Formatter};

/// Pre-edit snapshots of containers with provisional changes.
///
/// Keyed by container identity. A container has at most one snapshot, and
/// while it has one its committed value is the snapshot, not its live value.
/// Entries only leave through [`EphemeralStaging::take`].
pub struct EphemeralStaging<V> {
    snapshots: DashMap<ContainerId, V>,
}

impl<V> Default for EphemeralStaging<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> EphemeralStaging<V> {
    pub fn new() -> Self {
        EphemeralStaging {
            snapshots: DashMap::new(),
        }
    }

    pub fn contains(&self, id: &ContainerId) -> bool {
        self.snapshots.contains_key(id)
    }

    /// Stages `baseline` unless the container already has a snapshot.
    ///
    /// Returns true if `baseline` was stored.
    pub fn stage(&self, id: ContainerId, baseline: V) -> bool {
        match self.snapshots.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(baseline);
                true
            }
        }
    }

    /// Removes and returns the snapshot of the container.
    pub fn take(&self, id: &ContainerId) -> Option<V> {
        self.snapshots.remove(id).map(|(_, baseline)| baseline)
    }

    fn len(&self) -> usize {
        self.snapshots.len()
    }
}

impl<V: Clone> EphemeralStaging<V> {
    /// Returns a copy of the snapshot of the container.
    pub fn baseline(&self, id: &ContainerId) -> Option<V> {
        self.snapshots.get(id).map(|entry| entry.value().clone())
    }
}

impl<V> Debug for EphemeralStaging<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralStaging")
            .field("staged", &self.len())
            .finish()
    }
}
