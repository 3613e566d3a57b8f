use crate::container::{Container, ContainerId};
use crate::errors::{ErrorKind, TandemError, TandemResult};
use crate::patch::PatchEngine;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use uuid::Uuid;

/// The recorded edit of one container: its forward and reverse patches.
pub struct TransactionChange<E: PatchEngine> {
    container: Container<E::Value>,
    patches: Vec<E::Patch>,
    reverse_patches: Vec<E::Patch>,
}

impl<E: PatchEngine> TransactionChange<E> {
    /// Creates a change for `container`.
    ///
    /// Both patch lists must be non-empty; a no-op edit is never recorded.
    pub fn new(
        container: Container<E::Value>,
        patches: Vec<E::Patch>,
        reverse_patches: Vec<E::Patch>,
    ) -> TandemResult<Self> {
        if patches.is_empty() || reverse_patches.is_empty() {
            log::error!(
                "Change for container {} has {} patches and {} reverse patches",
                container.id(),
                patches.len(),
                reverse_patches.len()
            );
            return Err(TandemError::new(
                "A change needs both forward and reverse patches",
                ErrorKind::InvalidPatch,
            ));
        }

        Ok(TransactionChange {
            container,
            patches,
            reverse_patches,
        })
    }

    pub fn container(&self) -> &Container<E::Value> {
        &self.container
    }

    pub fn patches(&self) -> &[E::Patch] {
        &self.patches
    }

    pub fn reverse_patches(&self) -> &[E::Patch] {
        &self.reverse_patches
    }
}

impl<E: PatchEngine> Clone for TransactionChange<E> {
    fn clone(&self) -> Self {
        TransactionChange {
            container: self.container.clone(),
            patches: self.patches.clone(),
            reverse_patches: self.reverse_patches.clone(),
        }
    }
}

impl<E: PatchEngine> Debug for TransactionChange<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionChange")
            .field("container", &self.container.id())
            .field("patches", &self.patches.len())
            .field("reverse_patches", &self.reverse_patches.len())
            .finish()
    }
}

/// An atomic group of container changes, undone and redone as one unit.
///
/// A transaction holds at most one change per container. Applying it writes
/// nothing unless every change could be computed.
pub struct Transaction<E: PatchEngine> {
    id: String,
    changes: Vec<TransactionChange<E>>,
    containers: HashSet<ContainerId>,
}

impl<E: PatchEngine> Default for Transaction<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PatchEngine> Transaction<E> {
    pub fn new() -> Self {
        Transaction {
            id: Uuid::new_v4().to_string(),
            changes: Vec::new(),
            containers: HashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn changes(&self) -> &[TransactionChange<E>] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns true if this transaction changes the container with `id`.
    pub fn contains(&self, id: &ContainerId) -> bool {
        self.containers.contains(id)
    }

    /// Appends `change`.
    ///
    /// Fails with [`ErrorKind::DuplicateContainer`] if the transaction already
    /// holds a change for the same container.
    pub fn add(&mut self, change: TransactionChange<E>) -> TandemResult<()> {
        let id = change.container.id();
        if !self.containers.insert(id) {
            log::error!("Transaction {} already changes container {}", self.id, id);
            return Err(TandemError::new(
                &format!("Container {} is already part of transaction {}", id, self.id),
                ErrorKind::DuplicateContainer,
            ));
        }
        self.changes.push(change);
        Ok(())
    }

    /// Moves every container forward, in change order.
    pub fn apply_patches(&self, engine: &E) -> TandemResult<()> {
        let values = self
            .changes
            .iter()
            .map(|change| engine.apply_patches(&change.container.get(), &change.patches))
            .collect::<TandemResult<Vec<_>>>()
            .map_err(|err| self.apply_failed("redo", err))?;

        for (change, value) in self.changes.iter().zip(values) {
            change.container.set(value);
        }
        Ok(())
    }

    /// Moves every container back, walking the changes in reverse order.
    pub fn apply_reverse_patches(&self, engine: &E) -> TandemResult<()> {
        let values = self
            .changes
            .iter()
            .rev()
            .map(|change| engine.apply_patches(&change.container.get(), &change.reverse_patches))
            .collect::<TandemResult<Vec<_>>>()
            .map_err(|err| self.apply_failed("undo", err))?;

        for (change, value) in self.changes.iter().rev().zip(values) {
            change.container.set(value);
        }
        Ok(())
    }

    /// Exports the transaction's patches for diagnostics.
    pub fn to_json(&self) -> TandemResult<serde_json::Value>
    where
        E::Patch: Serialize,
    {
        let mut changes = Vec::with_capacity(self.changes.len());
        for change in &self.changes {
            changes.push(json!({
                "container": change.container.id().to_string(),
                "patches": serde_json::to_value(&change.patches)?,
                "reverse_patches": serde_json::to_value(&change.reverse_patches)?,
            }));
        }
        Ok(json!({ "id": self.id, "changes": changes }))
    }

    fn apply_failed(&self, direction: &str, cause: TandemError) -> TandemError {
        log::error!("Failed to {} transaction {}: {}", direction, self.id, cause);
        TandemError::new_with_cause(
            &format!("Failed to {} transaction {}", direction, self.id),
            cause.kind().clone(),
            cause,
        )
    }
}

impl<E: PatchEngine> Debug for Transaction<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("changes", &self.changes)
            .finish()
    }
}
