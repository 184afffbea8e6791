//! The three-level memory hierarchy: per-core L1 caches over a shared
//! main-memory/secondary-storage store.

pub mod cache;
pub mod hierarchy;
pub mod policies;

pub use cache::{Cache, DirtyEntry, Lookup};
pub use hierarchy::{MemoryCounterSnapshot, MemoryHierarchy};
pub use policies::ReplacementPolicy;
