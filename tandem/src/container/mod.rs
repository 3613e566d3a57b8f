//! The value container capability.
//!
//! A container is a uniform read/write handle over one piece of application
//! state. The transaction engine never looks inside a container; it only reads
//! the current value, writes a replacement, and tells containers apart by the
//! identity of their [`Container`] handle.

mod adapter;
mod observable;
mod value_container;

pub use adapter::FnContainer;
pub use observable::{ObservableStore, StoreEvent};
pub use value_container::{Container, ContainerId, ValueContainer};
