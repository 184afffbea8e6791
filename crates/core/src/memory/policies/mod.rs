//! Cache replacement policies.
//!
//! The per-core L1 modeled here is fully associative and keyed directly by
//! address (no set/way indexing — unlike the set-associative cache this
//! runtime's ancestor modeled, this one only needs "victim among all
//! resident addresses"). A [`ReplacementPolicy`] tracks exactly the
//! metadata its algorithm needs to answer that question in O(1).

/// First-In, First-Out: evict the oldest still-resident entry.
pub mod fifo;
/// Least Recently Used: evict the entry least recently accessed.
pub mod lru;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;

/// Victim-selection policy for a fully-associative cache keyed by address.
pub trait ReplacementPolicy: std::fmt::Debug + Send {
    /// Records that `addr` was just inserted (on a miss, after eviction if
    /// any).
    fn record_insert(&mut self, addr: u64);

    /// Records that `addr` was just accessed (hit or the insert above).
    fn record_access(&mut self, addr: u64);

    /// Removes `addr` from the policy's bookkeeping (the entry was
    /// explicitly invalidated rather than evicted through normal
    /// replacement).
    fn forget(&mut self, addr: u64);

    /// Selects and removes the next victim address from the policy's
    /// bookkeeping. Only called when the cache is at capacity; returns
    /// `None` if the policy has no tracked entries (should not happen given
    /// that precondition, but callers must not assume it can't).
    fn evict(&mut self) -> Option<u64>;

    /// Clears all bookkeeping (used by `Cache::invalidate`).
    fn clear(&mut self);
}
