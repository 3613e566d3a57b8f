use super::core::Transaction;
use crate::errors::TandemResult;
use crate::patch::PatchEngine;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Undo/redo availability, as delivered to subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Undo/redo stack controller.
///
/// Keeps applied transactions on the `current` stack and undone ones on the
/// `undone` stack. Every transaction it accepted lives on exactly one of them.
/// Recording a new transaction drops the redo stack, so redo only ever
/// replays a linear chain of undos.
///
/// A transaction whose patches fail to apply stays on the stack it was taken
/// from and the error is returned.
pub struct TransactionsManager<E: PatchEngine> {
    engine: Arc<E>,
    current: Vec<Transaction<E>>,
    undone: Vec<Transaction<E>>,
}

impl<E: PatchEngine> TransactionsManager<E> {
    pub fn new(engine: Arc<E>) -> Self {
        TransactionsManager {
            engine,
            current: Vec::new(),
            undone: Vec::new(),
        }
    }

    /// Applies `transaction` and records it.
    ///
    /// Returns `false` without touching anything if the transaction is empty.
    pub fn add(&mut self, transaction: Transaction<E>) -> TandemResult<bool> {
        if transaction.is_empty() {
            log::debug!("Ignoring empty transaction {}", transaction.id());
            return Ok(false);
        }

        transaction.apply_patches(&self.engine)?;
        log::debug!(
            "Recorded transaction {} with {} changes, dropping {} redoable",
            transaction.id(),
            transaction.len(),
            self.undone.len()
        );
        self.current.push(transaction);
        self.undone.clear();
        Ok(true)
    }

    /// Reverts the most recent transaction. Returns `false` if there is none.
    pub fn undo(&mut self) -> TandemResult<bool> {
        let Some(transaction) = self.current.pop() else {
            return Ok(false);
        };

        if let Err(err) = transaction.apply_reverse_patches(&self.engine) {
            self.current.push(transaction);
            return Err(err);
        }
        log::debug!("Undid transaction {}", transaction.id());
        self.undone.push(transaction);
        Ok(true)
    }

    /// Reapplies the most recently undone transaction. Returns `false` if there is none.
    pub fn redo(&mut self) -> TandemResult<bool> {
        let Some(transaction) = self.undone.pop() else {
            return Ok(false);
        };

        if let Err(err) = transaction.apply_patches(&self.engine) {
            self.undone.push(transaction);
            return Err(err);
        }
        log::debug!("Redid transaction {}", transaction.id());
        self.current.push(transaction);
        Ok(true)
    }

    /// Reverts every applied transaction, newest first, keeping all of them redoable.
    ///
    /// Returns the number of transactions reverted. On failure the transactions
    /// reverted so far stay undone.
    pub fn reset(&mut self) -> TandemResult<usize> {
        let mut reverted = 0;
        while self.undo()? {
            reverted += 1;
        }
        log::debug!("Reset reverted {} transactions", reverted);
        Ok(reverted)
    }

    /// Forgets both stacks without touching any container.
    pub fn clear(&mut self) {
        log::debug!(
            "Clearing history with {} applied and {} undone transactions",
            self.current.len(),
            self.undone.len()
        );
        self.current.clear();
        self.undone.clear();
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        !self.current.is_empty()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    /// Applied transactions, oldest first.
    pub fn current(&self) -> &[Transaction<E>] {
        &self.current
    }

    /// Undone transactions, the next one to redo last.
    pub fn undone(&self) -> &[Transaction<E>] {
        &self.undone
    }
}

impl<E: PatchEngine> Debug for TransactionsManager<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionsManager")
            .field("current", &self.current.len())
            .field("undone", &self.undone.len())
            .finish()
    }
}
