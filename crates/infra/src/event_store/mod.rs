//! Append-only event store boundary.
//!
//! Storage-agnostic abstraction for appending and loading per-aggregate event
//! streams. One stream per aggregate instance, sequence numbers starting at 1.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
