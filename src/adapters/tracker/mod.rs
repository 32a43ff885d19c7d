//! Work-tracker adapters.

mod in_memory;

pub use in_memory::InMemoryWorkTracker;
