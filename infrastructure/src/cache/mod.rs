//! Fast cache adapters.

mod memory_cache;

pub use memory_cache::InMemoryFastCache;
