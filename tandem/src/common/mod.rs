//! Shared building blocks: lock helpers and the listener registry.

mod event_bus;
mod type_utils;

pub use event_bus::{EventBus, EventCallback, EventListener, SubscriberRef};
pub use type_utils::{atomic, Atomic, ReadExecutor, WriteExecutor};
