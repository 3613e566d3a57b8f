//! Transactions and undo/redo history.
//!
//! A [`Transaction`] groups the changes of several containers so they are
//! undone and redone together. [`TransactionsManager`] keeps the two history
//! stacks and [`TransactionsStore`] builds transactions from batch edits,
//! stages ephemeral edits and notifies subscribers.

mod core;
mod ephemeral;
mod manager;
mod transactions_store;

pub use self::core::{Transaction, TransactionChange};
pub use ephemeral::EphemeralStaging;
pub use manager::{HistoryState, TransactionsManager};
pub use transactions_store::{HistorySnapshot, TransactionsStore};
