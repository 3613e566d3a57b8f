//! # Tandem - Transactional Undo/Redo
//!
//! Tandem mutates independent state containers together as one atomic,
//! reversible unit and keeps a linear undo/redo history of those units.
//!
//! ## Key Features
//!
//! - **Multi-container transactions**: one batch edit over any number of containers
//!   is recorded, undone and redone as a single step
//! - **Structural patches**: edits are captured on drafts and stored as forward and
//!   reverse patch lists produced by a pluggable [`PatchEngine`](patch::PatchEngine)
//! - **Ephemeral updates**: provisional edits that can be previewed live and later
//!   committed as one transaction or discarded back to their baseline
//! - **Subscriptions**: synchronous, ordered notification of undo/redo availability
//! - **Clean API**: cheap-to-clone handles over shared state
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use tandem::container::ObservableStore;
//! use tandem::transaction::TransactionsStore;
//!
//! let store = TransactionsStore::new();
//! let point = ObservableStore::new(json!({"x": 0, "y": 0}));
//! let container = point.container();
//!
//! // drag preview
//! store
//!     .create_ephemeral_transaction(&[container.clone()], |drafts| drafts[0]["x"] = json!(5))
//!     .unwrap();
//! store
//!     .create_ephemeral_transaction(&[container.clone()], |drafts| drafts[0]["y"] = json!(6))
//!     .unwrap();
//! assert!(!store.can_undo());
//!
//! // release
//! store.commit_ephemeral_updates(&container).unwrap();
//! assert_eq!(point.get(), json!({"x": 5, "y": 6}));
//!
//! store.undo().unwrap();
//! assert_eq!(point.get(), json!({"x": 0, "y": 0}));
//! ```
//!
//! ## Modules
//!
//! - [`container`]: value containers and their identity
//! - [`patch`]: draft-based structural diffing
//! - [`transaction`]: transactions, history stacks and the transactions store
//! - [`errors`]: error types
//! - [`common`]: shared lock helpers and the event bus

pub mod common;
pub mod container;
pub mod errors;
pub mod patch;
pub mod store_builder;
pub mod store_config;
pub mod transaction;

pub use common::{atomic, Atomic};
pub use store_builder::TransactionsStoreBuilder;
pub use store_config::StoreConfig;
